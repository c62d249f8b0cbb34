//! Registry and document loading.
//!
//! Loading is syntactic only: a missing file is `NotFound`, text that is not
//! well-formed YAML/JSON (or cannot be shaped into role records) is
//! `ParseError`. Semantic checks belong to the validators.

use crate::core::error::RolewireError;
use crate::core::model::RoleRecord;
use std::fs;
use std::io;
use std::path::Path;

/// Read a required input document as text.
pub fn read_document(path: &Path) -> Result<String, RolewireError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            RolewireError::NotFound(format!("{}: file not found", path.display()))
        }
        _ => RolewireError::IoError(e),
    })
}

pub fn parse_yaml_value(content: &str, origin: &str) -> Result<serde_yaml::Value, RolewireError> {
    serde_yaml::from_str(content)
        .map_err(|e| RolewireError::ParseError(format!("{}: invalid YAML ({})", origin, e)))
}

pub fn load_yaml_value(path: &Path) -> Result<serde_yaml::Value, RolewireError> {
    let content = read_document(path)?;
    parse_yaml_value(&content, &path.display().to_string())
}

pub fn load_json_value(path: &Path, label: &str) -> Result<serde_json::Value, RolewireError> {
    if !path.exists() {
        return Err(RolewireError::NotFound(format!("missing {}: {}", label, path.display())));
    }
    let content = read_document(path)?;
    serde_json::from_str(&content).map_err(|e| {
        RolewireError::ParseError(format!("invalid JSON in {} ({}): {}", label, path.display(), e))
    })
}

/// Parse role registry text. Registry documents are either a bare list or
/// a mapping with a `roles` list; input order is preserved.
pub fn parse_role_registry(content: &str, origin: &str) -> Result<Vec<RoleRecord>, RolewireError> {
    let value = parse_yaml_value(content, origin)?;

    let roles = match value {
        seq @ serde_yaml::Value::Sequence(_) => seq,
        serde_yaml::Value::Mapping(mut map) => match map.remove("roles") {
            Some(roles @ serde_yaml::Value::Sequence(_)) => roles,
            _ => {
                return Err(RolewireError::ParseError(format!(
                    "{}: expected a 'roles' list",
                    origin
                )));
            }
        },
        _ => {
            return Err(RolewireError::ParseError(format!(
                "{}: expected a list of roles or a mapping with a 'roles' list",
                origin
            )));
        }
    };

    serde_yaml::from_value(roles)
        .map_err(|e| RolewireError::ParseError(format!("{}: {}", origin, e)))
}

pub fn load_role_registry(path: &Path) -> Result<Vec<RoleRecord>, RolewireError> {
    let content = read_document(path)?;
    let roles = parse_role_registry(&content, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), roles = roles.len(), "loaded role registry");
    Ok(roles)
}
