//! Agent job-description assembly.
//!
//! A role's job description is merged from the shared section spec and the
//! role's own spec, checked for completeness, and rendered as markdown with
//! the governance lock metadata and any required protocol includes inlined.
//! Given the same inputs and `generated_at_utc`, output is byte-identical.

use crate::core::contract::LOCK_PATH;
use crate::core::error::RolewireError;
use crate::core::loader;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const SPEC_DIR: &str = "10-templates/job-description-spec";

/// Mandatory sections with their rendered titles, in output order.
pub const REQUIRED_SECTIONS: [(&str, &str); 8] = [
    ("mission", "Mission"),
    ("responsibilities", "Responsibilities"),
    ("non_responsibilities", "Non-Responsibilities"),
    (
        "authority_boundaries",
        "Authority Boundaries and Approval Limits",
    ),
    ("required_workflow", "Required Workflow"),
    ("escalation_triggers", "Escalation Triggers"),
    ("prohibited_actions", "Prohibited Actions"),
    ("output_quality_standards", "Output and Quality Standards"),
];

pub const PROTOCOL_INCLUDES_KEY: &str = "required_protocol_includes";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn is_known_key(key: &str) -> bool {
    key == PROTOCOL_INCLUDES_KEY || REQUIRED_SECTIONS.iter().any(|(k, _)| *k == key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub role_slug: String,
    pub role_name: Option<String>,
    pub source_ref: String,
    pub generated_at_utc: Option<String>,
}

impl JobRequest {
    pub fn new(role_slug: impl Into<String>) -> Self {
        Self {
            role_slug: role_slug.into(),
            role_name: None,
            source_ref: "unknown".to_string(),
            generated_at_utc: None,
        }
    }
}

pub type SectionSpec = BTreeMap<String, Vec<String>>;

/// Display name for a slug: known roles by table, otherwise title-cased.
pub fn default_role_name(slug: &str) -> String {
    match slug {
        "implementation-specialist" => "Implementation Specialist".to_string(),
        "compliance-officer" => "Compliance Officer".to_string(),
        _ => {
            let mut out = String::with_capacity(slug.len());
            let mut prev_alpha = false;
            for ch in slug.replace('-', " ").chars() {
                if prev_alpha {
                    out.extend(ch.to_lowercase());
                } else {
                    out.extend(ch.to_uppercase());
                }
                prev_alpha = ch.is_alphabetic();
            }
            out
        }
    }
}

/// Parse one section spec document: an object of known keys, each a list
/// of strings.
pub fn parse_section_spec(value: Value, origin: &Path) -> Result<SectionSpec, RolewireError> {
    let Value::Object(map) = value else {
        return Err(RolewireError::SchemaError(format!(
            "Spec must be a JSON object: {}",
            origin.display()
        )));
    };

    let mut spec = SectionSpec::new();
    for (key, value) in map {
        if !is_known_key(&key) {
            return Err(RolewireError::SchemaError(format!(
                "Unknown key '{}' in {}",
                key,
                origin.display()
            )));
        }
        let items = value
            .as_array()
            .and_then(|a| {
                a.iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                RolewireError::SchemaError(format!(
                    "Key '{}' must be an array of strings in {}",
                    key,
                    origin.display()
                ))
            })?;
        spec.insert(key, items);
    }
    Ok(spec)
}

/// Trim, drop empties and repeats; first occurrence wins.
fn dedupe_preserve_order<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let normalized = item.trim();
        if normalized.is_empty() || !seen.insert(normalized.to_string()) {
            continue;
        }
        out.push(normalized.to_string());
    }
    out
}

/// Global entries first, then the role's; every mandatory section must end
/// up non-empty.
pub fn merge_specs(global: &SectionSpec, role: &SectionSpec) -> Result<SectionSpec, RolewireError> {
    let empty = Vec::new();
    let keys = REQUIRED_SECTIONS
        .iter()
        .map(|(k, _)| *k)
        .chain(std::iter::once(PROTOCOL_INCLUDES_KEY));

    let mut merged = SectionSpec::new();
    for key in keys {
        let items = global
            .get(key)
            .unwrap_or(&empty)
            .iter()
            .chain(role.get(key).unwrap_or(&empty).iter());
        merged.insert(key.to_string(), dedupe_preserve_order(items));
    }

    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .map(|(k, _)| *k)
        .filter(|k| merged.get(*k).is_none_or(Vec::is_empty))
        .collect();
    if !missing.is_empty() {
        return Err(RolewireError::SchemaError(format!(
            "Merged spec missing required non-empty sections: {}",
            missing.join(", ")
        )));
    }
    Ok(merged)
}

fn require_file(path: &Path) -> Result<(), RolewireError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(RolewireError::NotFound(format!("Required source file missing: {}", path.display())))
    }
}

fn lock_field(lock: &Value, key: &str) -> String {
    match lock.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

struct SourcePaths {
    governance: PathBuf,
    charter: PathBuf,
    base_instructions: PathBuf,
    role_instructions: PathBuf,
    lock: PathBuf,
    global_spec: PathBuf,
    role_spec: PathBuf,
}

impl SourcePaths {
    fn new(root: &Path, slug: &str) -> Self {
        Self {
            governance: root.join("contracts/upstream/governance.md"),
            charter: root.join(format!("00-os/role-charters/{}.md", slug)),
            base_instructions: root.join("10-templates/agent-instructions/base.md"),
            role_instructions: root.join(format!(
                "10-templates/agent-instructions/roles/{}.md",
                slug
            )),
            lock: root.join(LOCK_PATH),
            global_spec: root.join(SPEC_DIR).join("global.json"),
            role_spec: root
                .join(SPEC_DIR)
                .join("roles")
                .join(format!("{}.json", slug)),
        }
    }
}

/// Assemble the job-description markdown for one role.
pub fn build_job_description(root: &Path, request: &JobRequest) -> Result<String, RolewireError> {
    let slug = request.role_slug.as_str();
    let paths = SourcePaths::new(root, slug);

    require_file(&paths.governance)?;
    require_file(&paths.charter)?;
    require_file(&paths.base_instructions)?;
    require_file(&paths.role_instructions)?;

    let lock = loader::load_json_value(&paths.lock, "contract lock file")?;
    if !lock.is_object() {
        return Err(RolewireError::SchemaError(format!(
            "Contract lock must be a JSON object: {}",
            paths.lock.display()
        )));
    }
    let global = parse_section_spec(
        loader::load_json_value(&paths.global_spec, "spec file")?,
        &paths.global_spec,
    )?;
    let role = parse_section_spec(
        loader::load_json_value(&paths.role_spec, "spec file")?,
        &paths.role_spec,
    )?;
    let merged = merge_specs(&global, &role)?;

    let role_name = request
        .role_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_role_name(slug));
    let generated_at = request
        .generated_at_utc
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string());

    let mut lines: Vec<String> = vec![
        "# Agent Job Description".to_string(),
        String::new(),
        format!("Role: {}", role_name),
        format!("Role-Slug: {}", slug),
        "Source-Repo: Context-Engineering-Implementation".to_string(),
        format!("Source-Ref: {}", request.source_ref),
        format!(
            "Governance-Contract-Version: {}",
            lock_field(&lock, "contract_version")
        ),
        format!(
            "Governance-Source-Commit: {}",
            lock_field(&lock, "source_commit")
        ),
        format!("Generated-At-UTC: {}", generated_at),
        "Job-Description-Spec-Version: 1".to_string(),
        String::new(),
    ];

    for (key, title) in REQUIRED_SECTIONS {
        lines.push(format!("## {}", title));
        lines.push(String::new());
        for item in merged.get(key).into_iter().flatten() {
            lines.push(format!("- {}", item));
        }
        lines.push(String::new());
    }

    lines.extend([
        "## Source Metadata".to_string(),
        String::new(),
        "- Canonical source chain (authoritative order):".to_string(),
        "  1. `contracts/upstream/governance.md`".to_string(),
        "  2. `00-os/role-charters/`".to_string(),
        "  3. `10-templates/agent-instructions/`".to_string(),
        "  4. `10-templates/job-description-spec/`".to_string(),
        "  5. `contracts/governance-contract-lock.json`".to_string(),
        "- Assembly inputs:".to_string(),
        "  - `10-templates/job-description-spec/global.json`".to_string(),
        format!(
            "  - `10-templates/job-description-spec/roles/{}.json`",
            slug
        ),
        format!("  - `00-os/role-charters/{}.md`", slug),
        "  - `10-templates/agent-instructions/base.md`".to_string(),
        format!("  - `10-templates/agent-instructions/roles/{}.md`", slug),
        "  - `contracts/upstream/governance.md`".to_string(),
        "  - `contracts/governance-contract-lock.json`".to_string(),
        "- Builder: `rolewire job-description`".to_string(),
        String::new(),
    ]);

    let includes = merged
        .get(PROTOCOL_INCLUDES_KEY)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if !includes.is_empty() {
        lines.push("## Required Protocol Includes".to_string());
        lines.push(String::new());
        for include in includes {
            let path = root.join(include);
            require_file(&path)?;
            let body = loader::read_document(&path)?;
            lines.push(format!("### `{}`", include));
            lines.push(String::new());
            lines.push(body.trim_end().to_string());
            lines.push(String::new());
        }
    }

    let mut out = lines.join("\n").trim_end().to_string();
    out.push('\n');
    tracing::debug!(role = slug, bytes = out.len(), "assembled job description");
    Ok(out)
}

/// `rolewire job-description`
pub fn run_job_description(root: &Path, request: &JobRequest) -> Result<(), RolewireError> {
    let text = build_job_description(root, request)?;
    print!("{}", text);
    Ok(())
}
