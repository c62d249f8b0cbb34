//! Implementation boundary rules.
//!
//! Every file in the repository (outside `.git/`) is matched against a fixed
//! rule table. Patterns use shell-style wildcards where `*` also crosses
//! `/`, so `00-os/adr/**` catches nested ADR files.

use crate::core::error::RolewireError;
use crate::core::validate::{ValidationReport, ViolationKind};
use glob::Pattern;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct BoundaryRule {
    pub id: &'static str,
    pub pattern: &'static str,
    pub message: &'static str,
    pub remediation: &'static str,
}

pub const RULES: [BoundaryRule; 6] = [
    BoundaryRule {
        id: "BND-IMP-001",
        pattern: "governance.md",
        message: "Governance authority document is not allowed in implementation repository.",
        remediation: "Move governance.md to context-engineering-governance and reference it via contract.",
    },
    BoundaryRule {
        id: "BND-IMP-002",
        pattern: "context-flow.md",
        message: "Context-flow governance document is not allowed in implementation repository.",
        remediation: "Keep context-flow.md in context-engineering-governance.",
    },
    BoundaryRule {
        id: "BND-IMP-003",
        pattern: "00-os/adr/**",
        message: "Governance ADR artifacts are not allowed in implementation repository.",
        remediation: "Author ADR files only in context-engineering-governance.",
    },
    BoundaryRule {
        id: "BND-IMP-004",
        pattern: "00-os/workflow.md",
        message: "Governance workflow authority document is not allowed in implementation repository.",
        remediation: "Keep governance workflow source in context-engineering-governance.",
    },
    BoundaryRule {
        id: "BND-IMP-005",
        pattern: "00-os/protected-path-policy-map.md",
        message: "Protected-path policy map authority is not allowed in implementation repository.",
        remediation: "Define protected-path policy only in context-engineering-governance.",
    },
    BoundaryRule {
        id: "BND-IMP-006",
        pattern: "contracts/governance-implementation-contract.json",
        message: "Canonical governance contract source must not live in implementation repository root contracts path.",
        remediation: "Keep canonical contract in governance repo; only consume via lock/upstream mirror paths.",
    },
];

/// Repository files as sorted, `/`-separated paths relative to `root`.
pub fn list_repo_files(root: &Path) -> Result<Vec<String>, RolewireError> {
    let mut out = Vec::new();
    collect_files(root, root, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), RolewireError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // `file_type` does not follow links: linked directories are not
        // descended, linked files still count.
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if dir == root && path.file_name().is_some_and(|n| n == ".git") {
                continue;
            }
            collect_files(root, &path, out)?;
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            if let Ok(rel) = path.strip_prefix(root) {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }
    Ok(())
}

/// Rule hits for a file list, formatted and sorted.
pub fn check_files(files: &[String]) -> Result<Vec<String>, RolewireError> {
    let compiled = RULES
        .iter()
        .map(|rule| {
            Pattern::new(rule.pattern)
                .map(|p| (rule, p))
                .map_err(|e| RolewireError::ConfigError(format!("{}: {}", rule.id, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut hits = Vec::new();
    for file in files {
        for (rule, pattern) in &compiled {
            if pattern.matches(file) {
                hits.push(format!(
                    "{} error {} {} | remediation: {}",
                    rule.id, file, rule.message, rule.remediation
                ));
            }
        }
    }
    hits.sort();
    Ok(hits)
}

/// `rolewire validate boundary`
pub fn run_boundary(root: &Path) -> Result<ValidationReport, RolewireError> {
    let files = list_repo_files(root)?;
    tracing::debug!(files = files.len(), "scanning for boundary rules");

    let mut report = ValidationReport::new("Implementation boundary");
    let hits = check_files(&files)?;
    let clean = files.len().saturating_sub(hits.len());
    for _ in 0..clean {
        report.pass();
    }
    for hit in hits {
        report.fail(ViolationKind::Boundary, hit);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_rule_patterns() {
        let hits = check_files(&files(&[
            "README.md",
            "docs/governance.md",
            "00-os/adr/0001-record.md",
            "00-os/adr/nested/0002.md",
            "contracts/upstream/governance-implementation-contract.json",
        ]))
        .unwrap();
        assert_eq!(hits.len(), 2);
        let adr = "BND-IMP-003 error 00-os/adr/";
        assert!(hits.iter().all(|h| h.starts_with(adr)));
    }

    #[test]
    fn test_hit_format() {
        let hits = check_files(&files(&["governance.md"])).unwrap();
        assert_eq!(
            hits,
            vec!["BND-IMP-001 error governance.md Governance authority document is not allowed in implementation repository. | remediation: Move governance.md to context-engineering-governance and reference it via contract."]
        );
    }

    #[test]
    fn test_list_repo_files_skips_git() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".git/objects")).unwrap();
        fs::write(tmp.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(tmp.path().join("00-os/adr")).unwrap();
        fs::write(tmp.path().join("00-os/adr/0001.md"), "x").unwrap();
        fs::write(tmp.path().join("README.md"), "x").unwrap();

        let listed = list_repo_files(tmp.path()).unwrap();
        assert_eq!(listed, vec!["00-os/adr/0001.md", "README.md"]);

        let report = run_boundary(tmp.path()).unwrap();
        assert_eq!(report.count(ViolationKind::Boundary), 1);
        assert_eq!(report.passed, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_repo_files_skips_linked_directories() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("governance.md"), "x").unwrap();

        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("README.md"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("vendor")).unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        std::os::unix::fs::symlink("..", tmp.path().join("docs/up")).unwrap();
        std::os::unix::fs::symlink("README.md", tmp.path().join("LINKED.md")).unwrap();

        let listed = list_repo_files(tmp.path()).unwrap();
        assert_eq!(listed, vec!["LINKED.md", "README.md"]);

        let report = run_boundary(tmp.path()).unwrap();
        assert_eq!(report.count(ViolationKind::Boundary), 0);
    }
}
