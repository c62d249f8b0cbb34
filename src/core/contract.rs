//! Governance contract consumption validation.
//!
//! The consuming repository pins the upstream governance contract in a lock
//! file. The lock must name the upstream version textually (not just
//! semver-compatibly), and the supported major must agree three ways: lock,
//! parsed upstream version, and the upstream's own compatibility claim.
//! Governance authority documents must not live in the consuming tree.

use crate::core::error::RolewireError;
use crate::core::loader;
use crate::core::validate::{ValidationReport, ViolationKind};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

pub const UPSTREAM_CONTRACT_PATH: &str =
    "contracts/upstream/governance-implementation-contract.json";
pub const LOCK_PATH: &str = "contracts/governance-contract-lock.json";
pub const CONTRACT_BOUNDARY_PATH: &str = "CONTRACT_BOUNDARY.md";

/// Governance authority paths that must be absent from the consuming tree.
pub const BOUNDARY_BLOCKED_PATHS: [&str; 3] = ["governance.md", "context-flow.md", "00-os/adr"];

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)$").expect("version pattern compiles")
});

/// Strict `X.Y.Z` contract version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContractVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for ContractVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_PATTERN
            .captures(s)
            .ok_or_else(|| format!("must be semantic version format X.Y.Z (got '{}')", s))?;
        let part = |i: usize| -> Result<u64, String> {
            caps[i]
                .parse::<u64>()
                .map_err(|_| format!("component out of range (got '{}')", s))
        };
        Ok(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn require_keys(doc: &Value, label: &str, keys: &[&str], report: &mut ValidationReport) {
    for key in keys {
        if doc.get(key).is_some() {
            report.pass();
        } else {
            report.schema(format!("{} missing key '{}'", label, key));
        }
    }
}

/// Extract and strictly parse a version field.
fn version_field<'d>(
    doc: &'d Value,
    key: &str,
    field_label: &str,
    report: &mut ValidationReport,
) -> (Option<&'d str>, Option<ContractVersion>) {
    let Some(raw) = doc.get(key) else {
        return (None, None);
    };
    let Some(text) = raw.as_str() else {
        report.schema(format!("{} must be a string", field_label));
        return (None, None);
    };
    match text.parse::<ContractVersion>() {
        Ok(v) => {
            report.pass();
            (Some(text), Some(v))
        }
        Err(e) => {
            report.schema(format!("{} {}", field_label, e));
            (Some(text), None)
        }
    }
}

/// Check the upstream descriptor against the lock. Pure; every rule runs.
pub fn validate_contract_pair(upstream: &Value, lock: &Value, report: &mut ValidationReport) {
    let upstream_ok = upstream.is_object();
    let lock_ok = lock.is_object();
    if !upstream_ok {
        report.schema("upstream contract must be a JSON object");
    }
    if !lock_ok {
        report.schema("lock file must be a JSON object");
    }
    if !(upstream_ok && lock_ok) {
        return;
    }

    require_keys(
        upstream,
        "upstream contract",
        &[
            "contract_id",
            "version",
            "compatibility",
            "governance_authoritative_paths",
        ],
        report,
    );
    require_keys(
        lock,
        "lock file",
        &["contract_version", "supported_major", "source_commit"],
        report,
    );

    if let Some(paths) = upstream.get("governance_authoritative_paths") {
        let all_strings = paths
            .as_array()
            .is_some_and(|a| !a.is_empty() && a.iter().all(Value::is_string));
        if all_strings {
            report.pass();
        } else {
            report.schema(
                "upstream 'governance_authoritative_paths' must be a non-empty list of strings",
            );
        }
    }
    if let Some(commit) = lock.get("source_commit") {
        if commit.as_str().is_some_and(|s| !s.trim().is_empty()) {
            report.pass();
        } else {
            report.schema("lock 'source_commit' must be a non-empty string");
        }
    }

    let (upstream_text, upstream_version) =
        version_field(upstream, "version", "upstream contract 'version'", report);
    let (lock_text, _) = version_field(lock, "contract_version", "lock 'contract_version'", report);

    // Pinned to an authored release: exact text, not semver equivalence.
    if let (Some(up), Some(lk)) = (upstream_text, lock_text) {
        if up == lk {
            report.pass();
        } else {
            report.fail(
                ViolationKind::Referential,
                format!(
                    "lock contract_version '{}' does not match upstream version '{}'",
                    lk, up
                ),
            );
        }
    }

    let supported_major = match lock.get("supported_major") {
        None => None,
        Some(v) => match v.as_u64() {
            Some(n) => Some(n),
            None => {
                report.schema("lock 'supported_major' must be a non-negative integer");
                None
            }
        },
    };

    let declared_major = match upstream.get("compatibility") {
        None => None,
        Some(c) if !c.is_object() => {
            report.schema("upstream 'compatibility' must be an object");
            None
        }
        Some(c) => match c.get("supported_major_for_current_impl") {
            None => {
                report.schema(
                    "upstream compatibility missing key 'supported_major_for_current_impl'",
                );
                None
            }
            Some(v) => match v.as_u64() {
                Some(n) => Some(n),
                None => {
                    report.schema(
                        "upstream compatibility.supported_major_for_current_impl must be a non-negative integer",
                    );
                    None
                }
            },
        },
    };

    let parsed_major = upstream_version.map(|v| v.major);

    if let (Some(major), Some(supported)) = (parsed_major, supported_major) {
        if major == supported {
            report.pass();
        } else {
            report.fail(
                ViolationKind::Referential,
                format!(
                    "upstream major version {} is incompatible with supported_major {}",
                    major, supported
                ),
            );
        }
    }
    if let (Some(supported), Some(declared)) = (supported_major, declared_major) {
        if supported == declared {
            report.pass();
        } else {
            report.fail(
                ViolationKind::Referential,
                format!(
                    "lock supported_major {} does not match upstream compatibility.supported_major_for_current_impl {}",
                    supported, declared
                ),
            );
        }
    }
    if let (Some(major), Some(declared)) = (parsed_major, declared_major) {
        if major == declared {
            report.pass();
        } else {
            report.fail(
                ViolationKind::Referential,
                format!(
                    "upstream major version {} does not match upstream compatibility.supported_major_for_current_impl {}",
                    major, declared
                ),
            );
        }
    }
}

/// Boundary declaration present, authority paths absent.
pub fn validate_boundary_files(root: &Path, report: &mut ValidationReport) {
    if root.join(CONTRACT_BOUNDARY_PATH).exists() {
        report.pass();
    } else {
        report.fail(
            ViolationKind::Boundary,
            format!("missing {}", CONTRACT_BOUNDARY_PATH),
        );
    }

    for blocked in BOUNDARY_BLOCKED_PATHS {
        if root.join(blocked).exists() {
            report.fail(
                ViolationKind::Boundary,
                format!(
                    "boundary violation: '{}' must not exist in implementation repository",
                    blocked
                ),
            );
        } else {
            report.pass();
        }
    }
}

/// `rolewire validate contract`
///
/// Missing or unparseable documents abort; everything else accumulates.
pub fn run_contract(root: &Path) -> Result<ValidationReport, RolewireError> {
    let upstream =
        loader::load_json_value(&root.join(UPSTREAM_CONTRACT_PATH), "upstream contract")?;
    let lock = loader::load_json_value(&root.join(LOCK_PATH), "lock file")?;

    let mut report = ValidationReport::new("Governance contract consumption");
    validate_contract_pair(&upstream, &lock, &mut report);
    validate_boundary_files(root, &mut report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn upstream(version: &str, declared: u64) -> Value {
        json!({
            "contract_id": "governance-implementation",
            "version": version,
            "compatibility": { "supported_major_for_current_impl": declared },
            "governance_authoritative_paths": ["governance.md", "00-os/adr/"]
        })
    }

    fn lock(version: &str, major: Value) -> Value {
        json!({
            "contract_version": version,
            "supported_major": major,
            "source_commit": "4f1c2a9"
        })
    }

    fn check(up: &Value, lk: &Value) -> ValidationReport {
        let mut report = ValidationReport::new("test");
        validate_contract_pair(up, lk, &mut report);
        report
    }

    #[test]
    fn test_version_parse_is_strict() {
        assert_eq!(
            "2.1.0".parse::<ContractVersion>(),
            Ok(ContractVersion {
                major: 2,
                minor: 1,
                patch: 0
            })
        );
        for bad in ["2.1", "v2.1.0", "2.1.0-rc1", "2.1.0 ", "a.b.c", "1.2.3.4", ""] {
            assert!(
                bad.parse::<ContractVersion>().is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_matching_pair_passes() {
        let report = check(&upstream("2.1.0", 2), &lock("2.1.0", json!(2)));
        assert!(report.is_success(), "{:?}", report.messages());
    }

    #[test]
    fn test_version_mismatch_is_exact_text() {
        let report = check(&upstream("2.1.0", 2), &lock("2.0.0", json!(2)));
        assert_eq!(
            report.messages(),
            vec!["lock contract_version '2.0.0' does not match upstream version '2.1.0'"]
        );
    }

    #[test]
    fn test_major_mismatch_reports_each_pair() {
        let report = check(&upstream("2.1.0", 2), &lock("2.1.0", json!(1)));
        let msgs = report.messages();
        assert!(msgs.contains(
            &"upstream major version 2 is incompatible with supported_major 1".to_string()
        ));
        assert!(msgs.contains(&"lock supported_major 1 does not match upstream compatibility.supported_major_for_current_impl 2".to_string()));
        assert_eq!(msgs.len(), 2);

        let report = check(&upstream("3.0.0", 2), &lock("3.0.0", json!(1)));
        assert_eq!(report.count(ViolationKind::Referential), 3);
    }

    #[test]
    fn test_bad_shapes_accumulate() {
        let report = check(
            &json!({ "version": "2.1", "compatibility": [] }),
            &lock("2.1", json!(-1)),
        );
        let msgs = report.messages();
        assert!(msgs.contains(&"upstream contract missing key 'contract_id'".to_string()));
        assert!(msgs.contains(&"upstream contract 'version' must be semantic version format X.Y.Z (got '2.1')".to_string()));
        assert!(msgs.contains(&"lock 'contract_version' must be semantic version format X.Y.Z (got '2.1')".to_string()));
        assert!(msgs.contains(&"lock 'supported_major' must be a non-negative integer".to_string()));
        assert!(msgs.contains(&"upstream 'compatibility' must be an object".to_string()));
    }

    #[test]
    fn test_boundary_files() {
        let tmp = tempdir().unwrap();
        let mut report = ValidationReport::new("test");
        validate_boundary_files(tmp.path(), &mut report);
        assert_eq!(report.messages(), vec!["missing CONTRACT_BOUNDARY.md"]);

        std::fs::write(tmp.path().join(CONTRACT_BOUNDARY_PATH), "# Boundary").unwrap();
        std::fs::create_dir_all(tmp.path().join("00-os/adr")).unwrap();
        std::fs::write(tmp.path().join("governance.md"), "x").unwrap();
        let mut report = ValidationReport::new("test");
        validate_boundary_files(tmp.path(), &mut report);
        assert_eq!(
            report.messages(),
            vec![
                "boundary violation: 'governance.md' must not exist in implementation repository",
                "boundary violation: '00-os/adr' must not exist in implementation repository",
            ]
        );
    }

    #[test]
    fn test_run_contract_missing_lock_is_fatal() {
        let tmp = tempdir().unwrap();
        let up_path = tmp.path().join(UPSTREAM_CONTRACT_PATH);
        std::fs::create_dir_all(up_path.parent().unwrap()).unwrap();
        std::fs::write(&up_path, upstream("1.0.0", 1).to_string()).unwrap();
        let err = run_contract(tmp.path()).unwrap_err();
        assert!(matches!(err, RolewireError::NotFound(_)));
    }
}
