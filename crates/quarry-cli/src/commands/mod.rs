//! CLI command implementations

pub mod load;
pub mod simulate;

use anyhow::{Context, Result};
use quarry_core::StoreConfig;
use std::collections::BTreeMap;
use std::path::Path;

/// Load a store config if a path was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    match path {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(StoreConfig::default()),
    }
}

/// Component name -> index size
pub fn index_sizes(store: &quarry_ecs::Store) -> BTreeMap<String, usize> {
    store
        .component_names()
        .into_iter()
        .map(|name| {
            let len = store.index_len(&name);
            (name, len)
        })
        .collect()
}
