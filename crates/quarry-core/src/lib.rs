//! Quarry Core - Foundational types for the Quarry entity store
//!
//! This crate provides the core types that all other Quarry crates depend on:
//! - `EntityId` - Stable string entity identifiers
//! - `IdGenerator` - Batch-aware id minting for bulk adds
//! - `StoreConfig` - TOML-loadable store configuration
//! - Error types and Result alias

mod config;
mod error;
mod id;

pub use config::{RemovalPolicy, StoreConfig};
pub use error::{QuarryError, Result};
pub use id::{Batch, EntityId, IdGenerator, DEFAULT_ID_PREFIX, ID_FIELD};

/// Component values are stored as TOML values
pub use toml::Value;
