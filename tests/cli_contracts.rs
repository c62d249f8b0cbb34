use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const REGISTRY: &str = r#"roles:
  - slug: implementation-specialist
    repo_name: context-engineering-role-implementation-specialist
    menu_order: 1
    menu_label: implementation-specialist
    github_app:
      app_id_secret: IS_APP_ID
      private_key_secret: IS_PRIVATE_KEY
      env_prefix: IMPLEMENTATION_SPECIALIST
      app_id_value: 1000
      installation_id_value: 1001
    compose:
      service_name: implementation-specialist-workstation
      image_suffix: implementation-specialist
      profile: null
      volume_prefix: implementation_specialist
  - slug: compliance-officer
    repo_name: context-engineering-role-compliance-officer
    menu_order: 2
    menu_label: compliance-officer
    github_app:
      app_id_secret: CO_APP_ID
      private_key_secret: CO_PRIVATE_KEY
      env_prefix: COMPLIANCE_OFFICER
      app_id_value: 2000
      installation_id_value: 2001
    compose:
      service_name: compliance-officer-workstation
      image_suffix: compliance-officer
      profile: compliance-officer
      volume_prefix: compliance_officer
"#;

const HOST_FILES: [(&str, &[&str]); 5] = [
    (
        ".github/workflows/sync-role-repos.yml",
        &["ROLE_CHOICES", "ROLE_MATRIX"],
    ),
    (
        ".github/workflows/publish-role-workstation-images.yml",
        &["ROLE_MATRIX"],
    ),
    (
        ".devcontainer-workstation/scripts/start-role-workstation.sh",
        &[
            "ROLE_MENU",
            "ROLE_MENU_CASE",
            "NORMALIZE_ROLE_CASES",
            "ROLE_MAPPING_CASES",
        ],
    ),
    (
        ".devcontainer-workstation/docker-compose.yml",
        &["SERVICES", "VOLUMES"],
    ),
    (
        ".devcontainer-workstation/docker-compose.ghcr.yml",
        &["SERVICES", "VOLUMES"],
    ),
];

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn wired_repo(registry: &str) -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "00-os/role-registry.yml", registry);
    for (rel, markers) in HOST_FILES {
        let mut body = String::from("# host file\n");
        for marker in markers {
            body.push_str(&format!("# GENERATED:BEGIN:{m}\n# GENERATED:END:{m}\n", m = marker));
        }
        body.push_str("# trailer\n");
        write(tmp.path(), rel, &body);
    }
    tmp
}

fn rolewire(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rolewire"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("ROLEWIRE_LOG")
        .output()
        .expect("failed to execute rolewire")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn generate_then_check_round_trip() {
    let tmp = wired_repo(REGISTRY);

    let first = rolewire(tmp.path(), &["generate"]);
    assert!(first.status.success(), "{}", stderr(&first));
    let out = stdout(&first);
    assert!(out.contains("generate: loaded 2 roles from registry"));
    assert!(out.contains("generate: complete: 11 of 11 regions updated"));

    let menu = fs::read_to_string(
        tmp.path()
            .join(".devcontainer-workstation/scripts/start-role-workstation.sh"),
    )
    .unwrap();
    assert!(menu.starts_with("# host file\n"));
    assert!(menu.ends_with("# GENERATED:END:ROLE_MAPPING_CASES\n# trailer\n"));

    let again = rolewire(tmp.path(), &["generate"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("generate: complete: 0 of 11 regions updated"));

    let check = rolewire(tmp.path(), &["generate", "--check"]);
    assert!(check.status.success(), "{}", stderr(&check));
    assert!(stdout(&check).contains("generate: all 11 generated regions are up to date"));
}

#[test]
fn check_reports_drift_without_writing() {
    let tmp = wired_repo(REGISTRY);
    let compose = tmp
        .path()
        .join(".devcontainer-workstation/docker-compose.yml");
    let before = fs::read_to_string(&compose).unwrap();

    let output = rolewire(tmp.path(), &["generate", "--check"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("generate: 11 generated regions are out of sync:"));
    assert!(out.contains(
        "  - .devcontainer-workstation/docker-compose.yml [SERVICES compose-build-services]"
    ));
    assert!(out.contains("generate: run `rolewire generate` to refresh them"));
    let err = stderr(&output);
    assert!(err.contains("rolewire: Validation error: 11 generated region(s) out of sync"));
    assert_eq!(fs::read_to_string(&compose).unwrap(), before);
}

#[test]
fn deny_policy_rejects_multiple_default_services() {
    let registry = REGISTRY.replace("profile: compliance-officer", "profile: \"\"");
    let tmp = wired_repo(&registry);

    let output = rolewire(
        tmp.path(),
        &["generate", "--default-service-policy", "deny"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("2 roles have no compose profile"));

    let allowed = rolewire(tmp.path(), &["generate"]);
    assert!(allowed.status.success(), "{}", stderr(&allowed));
}

#[test]
fn config_file_overrides_registry_path() {
    let tmp = wired_repo(REGISTRY);
    fs::rename(
        tmp.path().join("00-os/role-registry.yml"),
        tmp.path().join("roles.yml"),
    )
    .unwrap();

    let missing = rolewire(tmp.path(), &["generate"]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("file not found"));

    write(tmp.path(), "rolewire.toml", "registry = \"roles.yml\"\n");
    let output = rolewire(tmp.path(), &["generate"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn missing_marker_counts_failed_targets() {
    let tmp = wired_repo(REGISTRY);
    write(
        tmp.path(),
        ".github/workflows/publish-role-workstation-images.yml",
        "name: publish\n",
    );

    let output = rolewire(tmp.path(), &["generate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("generate: complete: 10 of 10 regions updated"));
    assert!(stderr(&output).contains("1 of 5 targets failed"));
    assert_eq!(
        fs::read_to_string(
            tmp.path()
                .join(".github/workflows/publish-role-workstation-images.yml")
        )
        .unwrap(),
        "name: publish\n"
    );
}

const GOVERNED_REPOS: &str = r#"metadata:
  version: 1
  last_updated: "2026-02-01"
  canonical_source: governance/repos.yml
  governing_policy_ref: governance.md
state_model:
  autonomous: { description: "self-governed" }
  transition: { description: "moving under governance" }
  governed: { description: "fully governed" }
repositories:
  - repo: Josh-Phillips-LLC/context-engineering-implementation
    family: implementation
    state: transition
    owner_role: compliance-officer
    marker_path: meta/marker.yml
"#;

const GOVERNANCE_MARKER: &str = r#"schema_version: 1
repository: Josh-Phillips-LLC/context-engineering-implementation
governance:
  owner_system: context-engineering
  owner_repo: Josh-Phillips-LLC/context-engineering-governance
  state: transition
  registry_ref: governance/repos.yml
  policy_ref: governance.md
controls:
  profile: transition
  required_reviews: [compliance-officer]
evidence:
  adoption_issue: "https://example.invalid/issues/12"
"#;

#[test]
fn validate_ownership_path_overrides() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "governance/repos.yml", GOVERNED_REPOS);
    write(tmp.path(), "meta/marker.yml", GOVERNANCE_MARKER);

    let defaults = rolewire(tmp.path(), &["validate", "ownership"]);
    assert_eq!(defaults.status.code(), Some(1));
    let out = stdout(&defaults);
    assert!(out.contains("  - 00-os/governed-repos.yml: file not found"));
    assert!(out.contains("  - .context-engineering/governance.yml: file not found"));

    let flags = rolewire(
        tmp.path(),
        &[
            "validate",
            "ownership",
            "--registry",
            "governance/repos.yml",
            "--marker",
            "meta/marker.yml",
        ],
    );
    assert!(flags.status.success(), "{}", stdout(&flags));
    assert!(stdout(&flags).contains(
        "Governance ownership validation passed (governance/repos.yml, meta/marker.yml)."
    ));

    write(
        tmp.path(),
        "rolewire.toml",
        "[ownership]\nregistry = \"governance/repos.yml\"\nmarker = \"meta/marker.yml\"\n",
    );
    let configured = rolewire(tmp.path(), &["validate", "ownership"]);
    assert!(configured.status.success(), "{}", stdout(&configured));

    let flag_wins = rolewire(
        tmp.path(),
        &["validate", "ownership", "--marker", "meta/missing.yml"],
    );
    assert_eq!(flag_wins.status.code(), Some(1));
    assert!(stdout(&flag_wins).contains("  - meta/missing.yml: file not found"));
}

#[test]
fn validate_ownership_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    let output = rolewire(tmp.path(), &["validate", "ownership", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let body: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(body["title"], "Governance ownership");
    assert_eq!(body["success"], false);
    assert_eq!(body["failed"], 2);
    assert_eq!(body["violations"][0]["kind"], "load");
}

#[test]
fn validate_boundary_text_output() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "README.md", "# repo\n");
    let clean = rolewire(tmp.path(), &["validate", "boundary"]);
    assert!(clean.status.success());
    assert!(stdout(&clean).contains("Implementation boundary validation passed."));

    write(tmp.path(), "governance.md", "# nope\n");
    let dirty = rolewire(tmp.path(), &["validate", "boundary"]);
    assert_eq!(dirty.status.code(), Some(1));
    let out = stdout(&dirty);
    assert!(out.contains("Implementation boundary validation failed:"));
    assert!(out.contains("  - BND-IMP-001 error governance.md "));
    assert!(out.contains("validate: summary pass=1 fail=1"));
}

#[test]
fn validate_contract_missing_upstream_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let output = rolewire(tmp.path(), &["validate", "contract"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing upstream contract"));
}

#[test]
fn job_description_prints_markdown() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "contracts/upstream/governance.md", "# Governance\n");
    write(
        root,
        "00-os/role-charters/systems-architect.md",
        "charter\n",
    );
    write(root, "10-templates/agent-instructions/base.md", "base\n");
    write(
        root,
        "10-templates/agent-instructions/roles/systems-architect.md",
        "role\n",
    );
    write(
        root,
        "contracts/governance-contract-lock.json",
        r#"{"contract_version": "2.1.0", "supported_major": 2, "source_commit": "9d2e41f"}"#,
    );
    write(
        root,
        "10-templates/job-description-spec/global.json",
        r#"{
  "mission": ["Deliver governed changes."],
  "responsibilities": ["Own the backlog."],
  "non_responsibilities": ["Policy authorship."],
  "authority_boundaries": ["No merges to main."],
  "required_workflow": ["Open a PR."],
  "escalation_triggers": ["Ambiguous policy."],
  "prohibited_actions": ["Force pushes."],
  "output_quality_standards": ["Tests pass."]
}"#,
    );
    write(
        root,
        "10-templates/job-description-spec/roles/systems-architect.json",
        "{}",
    );

    let output = rolewire(
        root,
        &[
            "job-description",
            "--role-slug",
            "systems-architect",
            "--generated-at-utc",
            "2026-03-01T12:00:00Z",
            "--source-ref",
            "main",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    let header: Vec<&str> = out.lines().take(10).collect();
    assert_eq!(
        header,
        vec![
            "# Agent Job Description",
            "",
            "Role: Systems Architect",
            "Role-Slug: systems-architect",
            "Source-Repo: Context-Engineering-Implementation",
            "Source-Ref: main",
            "Governance-Contract-Version: 2.1.0",
            "Governance-Source-Commit: 9d2e41f",
            "Generated-At-UTC: 2026-03-01T12:00:00Z",
            "Job-Description-Spec-Version: 1",
        ]
    );
    assert!(out.ends_with("- Builder: `rolewire job-description`\n"));
}
