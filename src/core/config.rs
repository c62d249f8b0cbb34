//! `rolewire.toml` configuration.
//!
//! The file is optional: no config means built-in defaults, which describe
//! the canonical workstation repository layout.

use crate::core::error::RolewireError;
use crate::core::projection::ProjectionKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "rolewire.toml";

/// How to treat a registry with more than one role lacking a compose profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DefaultServicePolicy {
    #[default]
    Allow,
    Warn,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeSettings {
    pub workspace_owner: String,
    pub ghcr_owner: String,
    pub image_prefix: String,
    pub build_context: String,
    pub dockerfile: String,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            workspace_owner: "Josh-Phillips-LLC".to_string(),
            ghcr_owner: "josh-phillips-llc".to_string(),
            image_prefix: "context-engineering-workstation".to_string(),
            build_context: "..".to_string(),
            dockerfile: ".devcontainer-workstation/Dockerfile".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub marker: String,
    pub projection: ProjectionKind,
}

/// One host file and the regions generated into it, in splice order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub path: PathBuf,
    pub regions: Vec<RegionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnershipPaths {
    pub registry: PathBuf,
    pub marker: PathBuf,
}

impl Default for OwnershipPaths {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("00-os/governed-repos.yml"),
            marker: PathBuf::from(".context-engineering/governance.yml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolewireConfig {
    pub registry: PathBuf,
    pub default_service_policy: DefaultServicePolicy,
    pub compose: ComposeSettings,
    pub targets: Vec<TargetSpec>,
    pub ownership: OwnershipPaths,
}

impl Default for RolewireConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("00-os/role-registry.yml"),
            default_service_policy: DefaultServicePolicy::Allow,
            compose: ComposeSettings::default(),
            targets: default_targets(),
            ownership: OwnershipPaths::default(),
        }
    }
}

fn target(path: &str, regions: &[(&str, ProjectionKind)]) -> TargetSpec {
    TargetSpec {
        path: PathBuf::from(path),
        regions: regions
            .iter()
            .map(|(marker, projection)| RegionSpec {
                marker: marker.to_string(),
                projection: *projection,
            })
            .collect(),
    }
}

/// The canonical wiring table.
pub fn default_targets() -> Vec<TargetSpec> {
    use ProjectionKind::*;
    vec![
        target(
            ".github/workflows/sync-role-repos.yml",
            &[
                ("ROLE_MATRIX", SyncMatrix),
                ("ROLE_CHOICES", DispatchChoices),
            ],
        ),
        target(
            ".github/workflows/publish-role-workstation-images.yml",
            &[("ROLE_MATRIX", PublishMatrix)],
        ),
        target(
            ".devcontainer-workstation/scripts/start-role-workstation.sh",
            &[
                ("ROLE_MENU", ShellMenu),
                ("ROLE_MENU_CASE", ShellMenuCase),
                ("NORMALIZE_ROLE_CASES", NormalizeRoleCases),
                ("ROLE_MAPPING_CASES", RoleMappingCases),
            ],
        ),
        target(
            ".devcontainer-workstation/docker-compose.yml",
            &[
                ("SERVICES", ComposeBuildServices),
                ("VOLUMES", ComposeVolumes),
            ],
        ),
        target(
            ".devcontainer-workstation/docker-compose.ghcr.yml",
            &[
                ("SERVICES", ComposeRegistryServices),
                ("VOLUMES", ComposeVolumes),
            ],
        ),
    ]
}

pub fn parse_config(content: &str, origin: &Path) -> Result<RolewireConfig, RolewireError> {
    toml::from_str(content)
        .map_err(|e| RolewireError::ConfigError(format!("{}: {}", origin.display(), e)))
}

/// Load config from an explicit path, or `<root>/rolewire.toml` if present.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<RolewireConfig, RolewireError> {
    let path = match explicit {
        Some(p) => {
            let p = if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            };
            if !p.is_file() {
                return Err(RolewireError::NotFound(format!(
                    "config file {} does not exist",
                    p.display()
                )));
            }
            p
        }
        None => {
            let p = root.join(CONFIG_FILE_NAME);
            if !p.is_file() {
                // No config = canonical defaults (not an error)
                return Ok(RolewireConfig::default());
            }
            p
        }
    };

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, &path)?;
    tracing::debug!(path = %path.display(), targets = config.targets.len(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = load_config(tmp.path(), None).unwrap();
        assert_eq!(config, RolewireConfig::default());
        assert_eq!(config.targets.len(), 5);
        let regions: usize = config.targets.iter().map(|t| t.regions.len()).sum();
        assert_eq!(regions, 11);
    }

    #[test]
    fn test_partial_config_overrides_only_named_keys() {
        let config = parse_config(
            r#"
default_service_policy = "deny"

[compose]
workspace_owner = "acme"

[[targets]]
path = "ops/compose.yml"
regions = [{ marker = "VOLUMES", projection = "compose-volumes" }]
"#,
            Path::new("rolewire.toml"),
        )
        .unwrap();
        assert_eq!(config.default_service_policy, DefaultServicePolicy::Deny);
        assert_eq!(config.compose.workspace_owner, "acme");
        assert_eq!(config.compose.ghcr_owner, "josh-phillips-llc");
        assert_eq!(config.registry, PathBuf::from("00-os/role-registry.yml"));
        assert_eq!(config.targets.len(), 1);
        assert_eq!(
            config.targets[0].regions[0].projection,
            ProjectionKind::ComposeVolumes
        );
    }

    #[test]
    fn test_unknown_projection_is_config_error() {
        let err = parse_config(
            "[[targets]]\npath = \"x\"\nregions = [{ marker = \"M\", projection = \"nope\" }]\n",
            Path::new("rolewire.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, RolewireError::ConfigError(_)));
    }

    #[test]
    fn test_explicit_missing_config_is_not_found() {
        let tmp = tempdir().unwrap();
        let err = load_config(tmp.path(), Some(Path::new("custom.toml"))).unwrap_err();
        assert!(matches!(err, RolewireError::NotFound(_)));
    }
}
