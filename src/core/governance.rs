//! Governance ownership validation.
//!
//! Two documents are checked: the governed-repository registry and the
//! repository's own governance marker. Each is validated for shape on its
//! own, then the marker is resolved against the registry and its declared
//! state compared with the registry's.
//!
//! Every finding is recorded as a path-qualified message, e.g.
//! `00-os/governed-repos.yml.repositories[2].state: invalid state 'x' (...)`.

use crate::core::error::RolewireError;
use crate::core::loader;
use crate::core::model::GovernanceState;
use crate::core::validate::{ValidationReport, ViolationKind};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static REPO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("repo id pattern compiles")
});

fn require_mapping<'v>(
    value: Option<&'v Value>,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'v Mapping> {
    match value.and_then(Value::as_mapping) {
        Some(m) => {
            report.pass();
            Some(m)
        }
        None => {
            report.schema(format!("{}: expected mapping/object", path));
            None
        }
    }
}

fn require_list<'v>(
    value: Option<&'v Value>,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'v Vec<Value>> {
    match value.and_then(Value::as_sequence) {
        Some(s) => {
            report.pass();
            Some(s)
        }
        None => {
            report.schema(format!("{}: expected list/array", path));
            None
        }
    }
}

fn require_keys(map: &Mapping, path: &str, keys: &[&str], report: &mut ValidationReport) {
    for key in keys {
        if map.contains_key(*key) {
            report.pass();
        } else {
            report.schema(format!("{}.{}: missing required key", path, key));
        }
    }
}

fn require_repo_id(value: Option<&Value>, path: &str, report: &mut ValidationReport) {
    match value.and_then(Value::as_str) {
        Some(s) if REPO_PATTERN.is_match(s) => report.pass(),
        _ => report.schema(format!("{}: expected OWNER/REPO string", path)),
    }
}

fn require_non_empty_string(value: Option<&Value>, path: &str, report: &mut ValidationReport) {
    match value.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => report.pass(),
        _ => report.schema(format!("{}: expected non-empty string", path)),
    }
}

fn require_state(value: Option<&Value>, path: &str, report: &mut ValidationReport) {
    let Some(raw) = value.and_then(Value::as_str) else {
        report.schema(format!("{}: expected string state value", path));
        return;
    };
    match raw.parse::<GovernanceState>() {
        Ok(_) => report.pass(),
        Err(e) => report.schema(format!("{}: {}", path, e)),
    }
}

/// Shape of the governed-repository registry.
pub fn validate_registry(data: &Value, path: &str, report: &mut ValidationReport) {
    let Some(root) = require_mapping(Some(data), path, report) else {
        return;
    };

    require_keys(
        root,
        path,
        &["metadata", "state_model", "repositories"],
        report,
    );

    let metadata_path = format!("{}.metadata", path);
    if let Some(metadata) = require_mapping(root.get("metadata"), &metadata_path, report) {
        require_keys(
            metadata,
            &metadata_path,
            &[
                "version",
                "last_updated",
                "canonical_source",
                "governing_policy_ref",
            ],
            report,
        );
    }

    let model_path = format!("{}.state_model", path);
    if let Some(state_model) = require_mapping(root.get("state_model"), &model_path, report) {
        for state in GovernanceState::ALL {
            let state_path = format!("{}.{}", model_path, state);
            match state_model.get(state.as_str()) {
                None => report.schema(format!("{}: missing required state definition", state_path)),
                Some(definition) => {
                    if let Some(def) = require_mapping(Some(definition), &state_path, report) {
                        require_keys(def, &state_path, &["description"], report);
                    }
                }
            }
        }
    }

    let repos_path = format!("{}.repositories", path);
    let Some(repositories) = require_list(root.get("repositories"), &repos_path, report) else {
        return;
    };
    if repositories.is_empty() {
        report.schema(format!("{}: must contain at least one repository entry", repos_path));
        return;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (idx, item) in repositories.iter().enumerate() {
        let item_path = format!("{}[{}]", repos_path, idx);
        let Some(entry) = require_mapping(Some(item), &item_path, report) else {
            continue;
        };

        require_keys(
            entry,
            &item_path,
            &["repo", "family", "state", "owner_role", "marker_path"],
            report,
        );

        let repo_path = format!("{}.repo", item_path);
        require_repo_id(entry.get("repo"), &repo_path, report);
        if let Some(repo) = entry.get("repo").and_then(Value::as_str) {
            if !seen.insert(repo) {
                report.schema(format!("{}: duplicate repository '{}'", repo_path, repo));
            }
        }

        require_state(entry.get("state"), &format!("{}.state", item_path), report);
        for field in ["family", "owner_role", "marker_path"] {
            require_non_empty_string(
                entry.get(field),
                &format!("{}.{}", item_path, field),
                report,
            );
        }
    }
}

/// Shape of a repository governance marker.
pub fn validate_marker(data: &Value, path: &str, report: &mut ValidationReport) {
    let Some(root) = require_mapping(Some(data), path, report) else {
        return;
    };

    require_keys(
        root,
        path,
        &[
            "schema_version",
            "repository",
            "governance",
            "controls",
            "evidence",
        ],
        report,
    );
    require_repo_id(
        root.get("repository"),
        &format!("{}.repository", path),
        report,
    );

    let gov_path = format!("{}.governance", path);
    if let Some(governance) = require_mapping(root.get("governance"), &gov_path, report) {
        require_keys(
            governance,
            &gov_path,
            &[
                "owner_system",
                "owner_repo",
                "state",
                "registry_ref",
                "policy_ref",
            ],
            report,
        );
        require_non_empty_string(
            governance.get("owner_system"),
            &format!("{}.owner_system", gov_path),
            report,
        );
        require_repo_id(
            governance.get("owner_repo"),
            &format!("{}.owner_repo", gov_path),
            report,
        );
        require_state(
            governance.get("state"),
            &format!("{}.state", gov_path),
            report,
        );
        for field in ["registry_ref", "policy_ref"] {
            require_non_empty_string(
                governance.get(field),
                &format!("{}.{}", gov_path, field),
                report,
            );
        }
    }

    let controls_path = format!("{}.controls", path);
    if let Some(controls) = require_mapping(root.get("controls"), &controls_path, report) {
        require_keys(
            controls,
            &controls_path,
            &["profile", "required_reviews"],
            report,
        );
        require_state(
            controls.get("profile"),
            &format!("{}.profile", controls_path),
            report,
        );

        let reviews_path = format!("{}.required_reviews", controls_path);
        if let Some(reviews) = require_list(controls.get("required_reviews"), &reviews_path, report)
        {
            if reviews.is_empty() {
                report.schema(format!("{}: must contain at least one reviewer", reviews_path));
            }
            for (idx, review) in reviews.iter().enumerate() {
                require_non_empty_string(
                    Some(review),
                    &format!("{}[{}]", reviews_path, idx),
                    report,
                );
            }
        }
    }

    let evidence_path = format!("{}.evidence", path);
    if let Some(evidence) = require_mapping(root.get("evidence"), &evidence_path, report) {
        require_keys(evidence, &evidence_path, &["adoption_issue"], report);
        require_non_empty_string(
            evidence.get("adoption_issue"),
            &format!("{}.adoption_issue", evidence_path),
            report,
        );
    }
}

/// Resolve the marker's repository in the registry and compare states.
///
/// Keys that did not parse into the expected shape are skipped here; their
/// schema violations were already recorded.
pub fn validate_cross_consistency(
    registry: &Value,
    marker: &Value,
    registry_path: &str,
    marker_path: &str,
    report: &mut ValidationReport,
) {
    let Some(repositories) = registry.get("repositories").and_then(Value::as_sequence) else {
        return;
    };
    let Some(marker_repo) = marker.get("repository").and_then(Value::as_str) else {
        return;
    };

    let entry = repositories
        .iter()
        .find(|item| item.get("repo").and_then(Value::as_str) == Some(marker_repo));

    let Some(entry) = entry else {
        report.fail(
            ViolationKind::Referential,
            format!(
                "{}.repository: '{}' not found in {}.repositories",
                marker_path, marker_repo, registry_path
            ),
        );
        return;
    };
    report.pass();

    let marker_state = marker
        .get("governance")
        .and_then(|g| g.get("state"))
        .and_then(Value::as_str);
    let registry_state = entry.get("state").and_then(Value::as_str);
    if let (Some(marker_state), Some(registry_state)) = (marker_state, registry_state) {
        if marker_state != registry_state {
            report.fail(
                ViolationKind::Referential,
                format!(
                    "{}.governance.state: '{}' does not match {}.repositories state '{}' for {}",
                    marker_path, marker_state, registry_path, registry_state, marker_repo
                ),
            );
        } else {
            report.pass();
        }
    }
}

/// Validate already-loaded documents. `None` means the document failed to
/// load; its own checks and the cross-check are skipped.
pub fn validate_documents(
    registry: Option<&Value>,
    marker: Option<&Value>,
    registry_path: &str,
    marker_path: &str,
    report: &mut ValidationReport,
) {
    if let Some(registry) = registry {
        validate_registry(registry, registry_path, report);
    }
    if let Some(marker) = marker {
        validate_marker(marker, marker_path, report);
    }
    if let (Some(registry), Some(marker)) = (registry, marker) {
        validate_cross_consistency(registry, marker, registry_path, marker_path, report);
    }
}

fn load_or_record(
    root: &Path,
    rel: &Path,
    report: &mut ValidationReport,
) -> Result<Option<Value>, RolewireError> {
    let display = rel.display().to_string();
    let loaded = loader::read_document(&root.join(rel))
        .and_then(|text| loader::parse_yaml_value(&text, &display));
    match loaded {
        Ok(v) => Ok(Some(v)),
        Err(RolewireError::NotFound(_)) => {
            report.fail(
                ViolationKind::Load,
                format!("{}: file not found", display),
            );
            Ok(None)
        }
        Err(RolewireError::ParseError(msg)) => {
            report.fail(ViolationKind::Load, msg);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// `rolewire validate ownership`
pub fn run_ownership(
    root: &Path,
    registry_rel: &Path,
    marker_rel: &Path,
) -> Result<ValidationReport, RolewireError> {
    let registry_path = registry_rel.display().to_string();
    let marker_path = marker_rel.display().to_string();
    let mut report = ValidationReport::new("Governance ownership")
        .with_detail(format!("{}, {}", registry_path, marker_path));

    let registry = load_or_record(root, registry_rel, &mut report)?;
    let marker = load_or_record(root, marker_rel, &mut report)?;
    validate_documents(
        registry.as_ref(),
        marker.as_ref(),
        &registry_path,
        &marker_path,
        &mut report,
    );

    Ok(report)
}
