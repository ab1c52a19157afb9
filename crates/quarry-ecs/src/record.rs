//! Detached entity records and patches

use quarry_core::{EntityId, Value, ID_FIELD};
use std::collections::BTreeMap;

/// A plain, detached entity record.
///
/// Records are what callers hand to `Store::add` and what `Store::delete`
/// hands back. Mutating a record never touches a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Entity id; a missing or empty id is generated on add
    pub id: Option<EntityId>,
    /// Component data: component_name -> value
    pub data: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record without an id
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with an id
    pub fn with_id(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            data: BTreeMap::new(),
        }
    }

    /// Builder-style component setter
    pub fn with(mut self, component: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(component, value);
        self
    }

    /// The id, if present and non-empty
    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    /// Get component data by name
    pub fn get(&self, component: &str) -> Option<&Value> {
        self.data.get(component)
    }

    /// Get mutable component data by name
    pub fn get_mut(&mut self, component: &str) -> Option<&mut Value> {
        self.data.get_mut(component)
    }

    /// Set component data. Setting `id` to a string sets the record id.
    pub fn set(&mut self, component: impl Into<String>, value: impl Into<Value>) {
        let component = component.into();
        let value = value.into();
        if component == ID_FIELD {
            if let Value::String(id) = value {
                self.id = Some(EntityId::new(id));
                return;
            }
        }
        self.data.insert(component, value);
    }

    /// Remove a component
    pub fn remove(&mut self, component: &str) -> Option<Value> {
        self.data.remove(component)
    }

    /// Check if a component exists
    pub fn has(&self, component: &str) -> bool {
        self.data.contains_key(component)
    }

    /// Get all component names
    pub fn component_names(&self) -> Vec<&str> {
        self.data.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A set of field writes to apply to one entity.
///
/// A `None` value clears the field; anything else sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: BTreeMap<String, Option<Value>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a component
    pub fn set(mut self, component: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(component.into(), Some(value.into()));
        self
    }

    /// Clear a component
    pub fn clear(mut self, component: impl Into<String>) -> Self {
        self.entries.insert(component.into(), None);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, Option<Value>)> {
        self.entries.into_iter()
    }
}

impl From<Record> for Patch {
    fn from(record: Record) -> Self {
        Self {
            entries: record.data.into_iter().map(|(k, v)| (k, Some(v))).collect(),
        }
    }
}

impl From<&Record> for Patch {
    fn from(record: &Record) -> Self {
        record.clone().into()
    }
}
