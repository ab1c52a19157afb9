//! Load entities from a TOML scene file
//!
//! The scene format belongs to this command only; the store itself has no
//! serialization format.

use crate::commands::{index_sizes, load_config};
use anyhow::{Context, Result};
use quarry_core::{EntityId, Value};
use quarry_ecs::{EntityHandle, Record, Store};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A scene file: a list of `[[entity]]` tables
#[derive(Debug, Default, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub entity: Vec<EntityDef>,
}

/// One `[[entity]]` table: an optional id plus component tables/values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(flatten)]
    pub components: BTreeMap<String, Value>,
}

impl From<EntityDef> for Record {
    fn from(def: EntityDef) -> Self {
        Record {
            id: def.id,
            data: def.components,
        }
    }
}

impl From<Record> for EntityDef {
    fn from(record: Record) -> Self {
        EntityDef {
            id: record.id,
            components: record.data,
        }
    }
}

/// Entity listing entry
#[derive(Debug, Serialize)]
pub struct EntitySummary {
    pub id: EntityId,
    pub components: Vec<String>,
}

impl From<&EntityHandle> for EntitySummary {
    fn from(handle: &EntityHandle) -> Self {
        let info = handle.info();
        EntitySummary {
            id: info.id,
            components: info.components,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub added: Vec<EntityId>,
    pub deleted: Vec<EntityDef>,
    pub entities: Vec<EntitySummary>,
    pub indices: BTreeMap<String, usize>,
}

pub fn run(scene: &Path, delete: &[String], config: Option<&Path>, format: &str) -> Result<()> {
    let content = std::fs::read_to_string(scene)
        .with_context(|| format!("Failed to read scene: {}", scene.display()))?;
    let report = load(&content, delete, config)?;

    let output = match format {
        "json" => serde_json::to_string_pretty(&report)?,
        "toml" => toml::to_string_pretty(&report)?,
        "text" => format_text(&report),
        _ => anyhow::bail!("Unknown format: {}", format),
    };
    println!("{}", output);
    Ok(())
}

pub fn load(content: &str, delete: &[String], config: Option<&Path>) -> Result<LoadReport> {
    let scene: SceneFile = toml::from_str(content).context("Failed to parse scene")?;
    let mut store = Store::with_config(load_config(config)?);

    let added = store
        .add(scene.entity.into_iter().map(Record::from))
        .context("Failed to add entities")?;
    let requests: Vec<Record> = delete.iter().map(|id| Record::with_id(id.as_str())).collect();
    let deleted = store.delete(&requests);

    Ok(LoadReport {
        added,
        deleted: deleted.into_iter().map(EntityDef::from).collect(),
        entities: store.entities().map(EntitySummary::from).collect(),
        indices: index_sizes(&store),
    })
}

fn format_text(report: &LoadReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("added {} entities\n", report.added.len()));
    for info in &report.entities {
        out.push_str(&format!("  {} [{}]\n", info.id, info.components.join(", ")));
    }
    if !report.deleted.is_empty() {
        let ids: Vec<String> = report
            .deleted
            .iter()
            .filter_map(|def| def.id.as_ref().map(|id| id.to_string()))
            .collect();
        out.push_str(&format!("delete requested: {}\n", ids.join(", ")));
    }
    out.push_str("indices:\n");
    for (name, len) in &report.indices {
        out.push_str(&format!("  {:<12} {}\n", name, len));
    }
    out.trim_end().to_string()
}
