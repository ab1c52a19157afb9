//! Error types for Quarry

use thiserror::Error;

/// The main error type for Quarry operations
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Field is immutable: {0}")]
    ImmutableField(String),

    #[error("Entity is no longer part of a store: {0}")]
    DetachedEntity(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("System '{system}' failed: {message}")]
    SystemFailed { system: String, message: String },
}

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

impl From<toml::de::Error> for QuarryError {
    fn from(err: toml::de::Error) -> Self {
        QuarryError::TomlParseError(err.to_string())
    }
}
