//! Store configuration, loadable from TOML

use crate::error::{QuarryError, Result};
use crate::id::DEFAULT_ID_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an entity is taken out of a component index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Scan and shift; remaining members keep insertion order
    #[default]
    Ordered,
    /// Scan and swap with the last member; order is not kept
    Swap,
}

/// Configuration for a `Store`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix for generated ids
    pub id_prefix: String,
    /// Index removal strategy
    pub removal: RemovalPolicy,
    /// Whether looking up an unknown id creates the entity
    pub auto_create: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            removal: RemovalPolicy::Ordered,
            auto_create: true,
        }
    }
}

impl StoreConfig {
    /// Parse a config from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.id_prefix.trim().is_empty() {
            return Err(QuarryError::Config("id_prefix must not be empty".into()));
        }
        Ok(())
    }
}
