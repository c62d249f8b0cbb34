//! Pure renderers from the role registry to region bodies.
//!
//! Matrix projections keep registry input order so that both workflow
//! matrices address roles in the registry's declared iteration order. Every
//! other projection is ordered by `menu_order` (stable, so ties keep input
//! order).

use crate::core::config::ComposeSettings;
use crate::core::model::RoleRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named projection kinds, addressable from `rolewire.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionKind {
    SyncMatrix,
    PublishMatrix,
    DispatchChoices,
    ShellMenu,
    ShellMenuCase,
    NormalizeRoleCases,
    RoleMappingCases,
    ComposeBuildServices,
    ComposeRegistryServices,
    ComposeVolumes,
}

impl ProjectionKind {
    pub fn name(self) -> &'static str {
        match self {
            ProjectionKind::SyncMatrix => "sync-matrix",
            ProjectionKind::PublishMatrix => "publish-matrix",
            ProjectionKind::DispatchChoices => "dispatch-choices",
            ProjectionKind::ShellMenu => "shell-menu",
            ProjectionKind::ShellMenuCase => "shell-menu-case",
            ProjectionKind::NormalizeRoleCases => "normalize-role-cases",
            ProjectionKind::RoleMappingCases => "role-mapping-cases",
            ProjectionKind::ComposeBuildServices => "compose-build-services",
            ProjectionKind::ComposeRegistryServices => "compose-registry-services",
            ProjectionKind::ComposeVolumes => "compose-volumes",
        }
    }

    /// Render this projection's region body.
    pub fn render(self, roles: &[RoleRecord], compose: &ComposeSettings) -> String {
        match self {
            ProjectionKind::SyncMatrix => sync_matrix(roles),
            ProjectionKind::PublishMatrix => publish_matrix(roles),
            ProjectionKind::DispatchChoices => dispatch_choices(roles),
            ProjectionKind::ShellMenu => shell_menu(roles),
            ProjectionKind::ShellMenuCase => shell_menu_case(roles),
            ProjectionKind::NormalizeRoleCases => normalize_role_cases(roles),
            ProjectionKind::RoleMappingCases => role_mapping_cases(roles),
            ProjectionKind::ComposeBuildServices => {
                compose_services(roles, compose, ComposeSource::Build)
            }
            ProjectionKind::ComposeRegistryServices => {
                compose_services(roles, compose, ComposeSource::Registry)
            }
            ProjectionKind::ComposeVolumes => compose_volumes(roles),
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roles in ascending `menu_order`.
pub fn by_menu_order(roles: &[RoleRecord]) -> Vec<&RoleRecord> {
    let mut sorted: Vec<&RoleRecord> = roles.iter().collect();
    sorted.sort_by_key(|r| r.menu_order);
    sorted
}

pub fn sync_matrix(roles: &[RoleRecord]) -> String {
    let mut lines = Vec::new();
    for role in roles {
        lines.push(format!("          - role_slug: {}", role.slug));
        lines.push(format!("            repo_name: {}", role.repo_name));
        lines.push(format!(
            "            app_id_secret: {}",
            role.github_app.app_id_secret
        ));
        lines.push(format!(
            "            private_key_secret: {}",
            role.github_app.private_key_secret
        ));
    }
    lines.join("\n")
}

pub fn publish_matrix(roles: &[RoleRecord]) -> String {
    let mut lines = Vec::new();
    for role in roles {
        lines.push(format!("          - role_profile: {}", role.slug));
        lines.push(format!("            image_suffix: {}", role.compose.image_suffix));
        lines.push(format!("            role_repo: {}", role.repo_name));
    }
    lines.join("\n")
}

pub fn dispatch_choices(roles: &[RoleRecord]) -> String {
    let mut lines = vec!["          - all".to_string()];
    lines.extend(
        by_menu_order(roles)
            .into_iter()
            .map(|r| format!("          - {}", r.slug)),
    );
    lines.join("\n")
}

pub fn shell_menu(roles: &[RoleRecord]) -> String {
    by_menu_order(roles)
        .into_iter()
        .map(|r| format!("  echo \"  {}) {}\"", r.menu_order, r.menu_label))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn shell_menu_case(roles: &[RoleRecord]) -> String {
    by_menu_order(roles)
        .into_iter()
        .map(|r| format!("    {}) ROLE=\"{}\" ;;", r.menu_order, r.menu_label))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn normalize_role_cases(roles: &[RoleRecord]) -> String {
    by_menu_order(roles)
        .into_iter()
        .map(|r| {
            let pattern = if r.slug != r.menu_label {
                format!("{}|{}", r.menu_label, r.slug)
            } else {
                r.menu_label.clone()
            };
            format!("    {}) echo \"{}\" ;;", pattern, r.menu_label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn role_mapping_cases(roles: &[RoleRecord]) -> String {
    let mut lines = Vec::new();
    for role in by_menu_order(roles) {
        lines.push(format!("  {})", role.menu_label));
        lines.push(format!("    ROLE_PROFILE=\"{}\"", role.slug));
        lines.push(format!("    SERVICE_NAME=\"{}\"", role.compose.service_name));
        lines.push(format!(
            "    PROFILE_NAME=\"{}\"",
            role.compose.profile.as_deref().unwrap_or("")
        ));
        lines.push(format!("    ROLE_ENV_PREFIX=\"{}\"", role.github_app.env_prefix));
        lines.push("    ;;".to_string());
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeSource {
    /// Local `build:` from the workstation Dockerfile.
    Build,
    /// Prebuilt image pulled from the container registry.
    Registry,
}

const VOLUME_MOUNTS: [(&str, &str); 4] = [
    ("_projects_data", "/workspace"),
    ("_gh_config", "/root/.config/gh"),
    ("_git_config", "/root/.config/git"),
    ("_codex_home", "/root/.codex"),
];

fn compose_services(
    roles: &[RoleRecord],
    settings: &ComposeSettings,
    source: ComposeSource,
) -> String {
    by_menu_order(roles)
        .into_iter()
        .map(|role| compose_service(role, settings, source))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn compose_service(
    role: &RoleRecord,
    settings: &ComposeSettings,
    source: ComposeSource,
) -> String {
    let compose = &role.compose;
    let mut svc = vec![format!("  {}:", compose.service_name)];

    match source {
        ComposeSource::Build => {
            svc.push("    build:".to_string());
            svc.push(format!("      context: {}", settings.build_context));
            svc.push(format!("      dockerfile: {}", settings.dockerfile));
            svc.push("      args:".to_string());
            svc.push(format!("        IMAGE_ROLE_PROFILE: {}", role.slug));
            svc.push(format!("    container_name: {}", compose.service_name));
        }
        ComposeSource::Registry => {
            svc.push(format!(
                "    image: ghcr.io/${{GHCR_OWNER:-{}}}/${{GHCR_IMAGE_PREFIX:-{}}}-{}:${{GHCR_IMAGE_TAG:-latest}}",
                settings.ghcr_owner, settings.image_prefix, compose.image_suffix
            ));
            svc.push(format!("    container_name: {}", compose.service_name));
            svc.push("    pull_policy: always".to_string());
        }
    }

    if let Some(profile) = &compose.profile {
        svc.push("    profiles:".to_string());
        svc.push(format!("      - {}", profile));
    }

    svc.push("    volumes:".to_string());
    for (suffix, target) in VOLUME_MOUNTS {
        if source == ComposeSource::Build && suffix == "_codex_home" {
            svc.push("      # - ssh_data:/root/.ssh".to_string());
        }
        svc.push(format!("      - {}{}:{}", compose.volume_prefix, suffix, target));
    }
    if source == ComposeSource::Build {
        svc.push(
            "      # Optional: forward host SSH agent into container for commit signing.".to_string(),
        );
        svc.push("      # Set HOST_SSH_AGENT_SOCK before compose up.".to_string());
        svc.push("      # - type: bind".to_string());
        svc.push("      #  source: ${HOST_SSH_AGENT_SOCK:-/tmp/codex-no-ssh-agent}".to_string());
        svc.push("      #  target: /ssh-agent".to_string());
    }

    svc.push("    environment:".to_string());
    svc.push("      - GH_BOOTSTRAP_TOKEN=${GH_BOOTSTRAP_TOKEN:-}".to_string());
    svc.push("      - OPENAI_API_KEY=${OPENAI_API_KEY:-}".to_string());
    svc.push("      - WORKSTATION_DEBUG=${WORKSTATION_DEBUG:-false}".to_string());
    svc.push("      - CODEX_HOME=/root/.codex".to_string());
    if source == ComposeSource::Build {
        svc.push("      # - SSH_AUTH_SOCK=/ssh-agent".to_string());
    }
    svc.extend(role_environment(role, settings));
    svc.push(String::new());

    if source == ComposeSource::Build {
        svc.push("    # Testing-mode autonomy".to_string());
    }
    // Uniform elevated runtime applied to every workstation.
    svc.push("    cap_add:".to_string());
    svc.push("      - ALL".to_string());
    svc.push("    privileged: true".to_string());
    svc.push("    init: true".to_string());
    svc.push("    entrypoint: [\"/usr/local/bin/init-workstation.sh\"]".to_string());
    svc.push("    command: [\"sleep\", \"infinity\"]".to_string());

    svc.join("\n")
}

/// Role-specific environment entries, overridable per `env_prefix`.
fn role_environment(role: &RoleRecord, settings: &ComposeSettings) -> Vec<String> {
    let slug = &role.slug;
    let repo = &role.repo_name;
    let prefix = &role.github_app.env_prefix;
    let app_id = &role.github_app.app_id_value;
    let inst_id = &role.github_app.installation_id_value;
    let owner = &settings.workspace_owner;

    let role_profile = if role.is_default_service() {
        format!("      - ROLE_PROFILE=${{ROLE_PROFILE:-{slug}}}")
    } else {
        format!("      - ROLE_PROFILE={slug}")
    };

    vec![
        role_profile,
        format!("      - ROLE_GITHUB_AUTH_MODE=${{{prefix}_ROLE_GITHUB_AUTH_MODE:-app}}"),
        format!("      - ROLE_GITHUB_APP_ID=${{{prefix}_ROLE_GITHUB_APP_ID:-{app_id}}}"),
        format!(
            "      - ROLE_GITHUB_APP_INSTALLATION_ID=${{{prefix}_ROLE_GITHUB_APP_INSTALLATION_ID:-{inst_id}}}"
        ),
        format!(
            "      - ROLE_GITHUB_APP_PRIVATE_KEY_PATH=${{{prefix}_ROLE_GITHUB_APP_PRIVATE_KEY_PATH:-}}"
        ),
        format!("      - WORKSPACE_REPO_OWNER=${{WORKSPACE_REPO_OWNER:-{owner}}}"),
        format!(
            "      - WORKSPACE_REPO_URL=${{{prefix}_WORKSPACE_REPO_URL:-https://github.com/{owner}/{repo}.git}}"
        ),
        format!(
            "      - WORKSPACE_REPO_DIR=/workspace/Projects/${{{prefix}_WORKSPACE_REPO_DIR_NAME:-{repo}}}"
        ),
        "      - AUTO_CLONE_WORKSPACE_REPO=${AUTO_CLONE_WORKSPACE_REPO:-true}".to_string(),
        "      - ALLOW_FALLBACK_INSTRUCTIONS=${ALLOW_FALLBACK_INSTRUCTIONS:-false}".to_string(),
    ]
}

pub fn compose_volumes(roles: &[RoleRecord]) -> String {
    let mut lines = Vec::new();
    for role in by_menu_order(roles) {
        for (suffix, _) in VOLUME_MOUNTS {
            lines.push(format!("  {}{}:", role.compose.volume_prefix, suffix));
        }
    }
    lines.join("\n")
}
