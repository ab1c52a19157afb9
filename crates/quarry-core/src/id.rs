//! Stable entity identifiers

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Name of the reserved identity field on every entity
pub const ID_FIELD: &str = "id";

/// Prefix used for ids minted by [`IdGenerator`]
pub const DEFAULT_ID_PREFIX: &str = "auto-generated";

/// A stable entity identifier.
///
/// Ids are either supplied by the caller or minted by the store's
/// [`IdGenerator`]. Once an entity exists its id never changes.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an EntityId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id is treated as "no id" by bulk adds
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:?})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mints ids for records added without one.
///
/// The counter advances once per non-empty batch, not once per record.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    count: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Number of batches started so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Start a batch of `len` records.
    ///
    /// Returns `None` for an empty batch, leaving the counter untouched.
    pub fn begin_batch(&mut self, len: usize) -> Option<Batch<'_>> {
        if len == 0 {
            return None;
        }
        let count = self.count;
        self.count += 1;
        Some(Batch {
            prefix: &self.prefix,
            count,
            len,
        })
    }
}

/// Id minting for a single bulk add
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    prefix: &'a str,
    count: u64,
    len: usize,
}

impl Batch<'_> {
    /// Id for the record at `position` within the batch.
    ///
    /// A single-record batch gets the bare counter value; larger batches
    /// append the zero-based position.
    pub fn id_for(&self, position: usize) -> EntityId {
        if self.len == 1 {
            EntityId(format!("{} {}", self.prefix, self.count))
        } else {
            EntityId(format!("{} {}.{}", self.prefix, self.count, position))
        }
    }
}
