use std::io;
use thiserror::Error;

/// Fatal errors. Accumulated validator findings (schema, referential,
/// boundary) are `validate::Violation`s instead and surface here only as the
/// final `ValidationError`.
#[derive(Error, Debug)]
pub enum RolewireError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Markers not found: {0}")]
    MarkerNotFound(String),
    #[error("Duplicate markers: {0}")]
    DuplicateMarker(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
