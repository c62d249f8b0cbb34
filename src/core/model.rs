//! Typed records shared by the projector and the validators.
//!
//! Role records are deserialized straight from the canonical registry.
//! Governance documents stay untyped (`serde_yaml::Value`) because their
//! validators must report every missing or mistyped key instead of failing
//! on the first one; only the enumerations they check live here.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One entry of the canonical role registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleRecord {
    pub slug: String,
    pub repo_name: String,
    pub menu_order: i64,
    pub menu_label: String,
    pub github_app: GithubApp,
    pub compose: ComposeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubApp {
    pub app_id_secret: String,
    pub private_key_secret: String,
    pub env_prefix: String,
    #[serde(deserialize_with = "scalar_text")]
    pub app_id_value: String,
    #[serde(deserialize_with = "scalar_text")]
    pub installation_id_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComposeSpec {
    pub service_name: String,
    pub image_suffix: String,
    #[serde(default, deserialize_with = "optional_profile")]
    pub profile: Option<String>,
    pub volume_prefix: String,
}

impl RoleRecord {
    /// A role without a compose profile runs as the unconditional default service.
    pub fn is_default_service(&self) -> bool {
        self.compose.profile.is_none()
    }
}

/// Registry ids are sometimes authored as bare integers.
fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Uint(n) => n.to_string(),
    })
}

fn optional_profile<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|p| !p.trim().is_empty()))
}

/// Oversight regime of a governed repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceState {
    Autonomous,
    Governed,
    Transition,
}

impl GovernanceState {
    /// Alphabetical, which is also the order used in diagnostics.
    pub const ALL: [GovernanceState; 3] = [
        GovernanceState::Autonomous,
        GovernanceState::Governed,
        GovernanceState::Transition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GovernanceState::Autonomous => "autonomous",
            GovernanceState::Governed => "governed",
            GovernanceState::Transition => "transition",
        }
    }

    /// `autonomous|governed|transition`
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for GovernanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovernanceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "autonomous" => Ok(GovernanceState::Autonomous),
            "governed" => Ok(GovernanceState::Governed),
            "transition" => Ok(GovernanceState::Transition),
            other => Err(format!(
                "invalid state '{}' (allowed: {})",
                other,
                Self::allowed_list()
            )),
        }
    }
}
