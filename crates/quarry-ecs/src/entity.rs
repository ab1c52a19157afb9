//! Entity handles: the only path through which entity fields change

use crate::index::{IndexTable, SharedIndex};
use crate::record::Record;
use log::warn;
use quarry_core::{EntityId, QuarryError, Result, Value, ID_FIELD};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

struct EntityInner {
    id: EntityId,
    fields: RefCell<BTreeMap<String, Value>>,
    /// Back-reference into the owning store's index table.
    /// Empty once the entity is removed.
    index: RefCell<Weak<RefCell<IndexTable>>>,
    /// False for handles made for ids the store never held
    registered: bool,
}

/// A reference-identity handle to one entity.
///
/// Cloning a handle is cheap and yields the same entity; two handles compare
/// equal only if they refer to the same entity instance. Every write keeps
/// the store's component indices consistent with the entity's fields.
///
/// Handles are single-threaded (`!Send`), like the store that issues them.
#[derive(Clone)]
pub struct EntityHandle(Rc<EntityInner>);

impl EntityHandle {
    pub(crate) fn attached(id: EntityId, index: &SharedIndex) -> Self {
        Self(Rc::new(EntityInner {
            id,
            fields: RefCell::new(BTreeMap::new()),
            index: RefCell::new(Rc::downgrade(index)),
            registered: true,
        }))
    }

    /// A handle for an id the store does not hold; writes fail with `EntityNotFound`
    pub(crate) fn unregistered(id: EntityId) -> Self {
        Self(Rc::new(EntityInner {
            id,
            fields: RefCell::new(BTreeMap::new()),
            index: RefCell::new(Weak::new()),
            registered: false,
        }))
    }

    pub(crate) fn detach(&self) {
        *self.0.index.borrow_mut() = Weak::new();
    }

    /// The entity's id
    pub fn id(&self) -> &EntityId {
        &self.0.id
    }

    /// Whether both handles refer to the same entity instance
    pub fn ptr_eq(&self, other: &EntityHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether writes through this handle still reach a store
    pub fn is_attached(&self) -> bool {
        self.0.index.borrow().strong_count() > 0
    }

    /// Current value of a field. Reading `id` yields the id as a string.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == ID_FIELD {
            return Some(Value::String(self.0.id.to_string()));
        }
        self.0.fields.borrow().get(key).cloned()
    }

    /// Whether a field is defined. `id` is always defined.
    pub fn has(&self, key: &str) -> bool {
        key == ID_FIELD || self.0.fields.borrow().contains_key(key)
    }

    /// Set a field, registering the entity in that component's index
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.write(key, Some(value.into()))
    }

    /// Remove a field, dropping the entity from that component's index.
    /// Removing an absent field is a no-op.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.write(key, None)
    }

    /// Write a field. `None` removes it.
    ///
    /// Touches at most one index collection. Fails with `ImmutableField` for
    /// `id`, with `DetachedEntity` once the entity has left its store, and
    /// with `EntityNotFound` for a handle the store never held. No failure
    /// changes any state.
    pub fn write(&self, key: &str, value: Option<Value>) -> Result<()> {
        if key == ID_FIELD {
            warn!("rejected write to '{}' on entity {}", ID_FIELD, self.0.id);
            return Err(QuarryError::ImmutableField(format!(
                "{}.{}",
                self.0.id, ID_FIELD
            )));
        }
        let index = self.index_table()?;

        match value {
            None => {
                index.borrow_mut().remove(key, self);
                self.0.fields.borrow_mut().remove(key);
            }
            Some(value) => {
                index.borrow_mut().insert(key, self);
                self.0.fields.borrow_mut().insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Mutate a present field in place.
    ///
    /// The field stays defined, so no index changes. Returns `None` when the
    /// field is absent. The closure works on a copy and no borrow is held
    /// while it runs, so it may read this same handle. If the closure
    /// deletes `key` through the handle, the updated copy is discarded.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        let mut value = self.0.fields.borrow().get(key).cloned()?;
        let result = f(&mut value);
        if let Some(slot) = self.0.fields.borrow_mut().get_mut(key) {
            *slot = value;
        }
        Some(result)
    }

    /// Names of the defined fields, excluding `id`
    pub fn component_names(&self) -> Vec<String> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    /// Detached copy of the entity, id included
    pub fn snapshot(&self) -> Record {
        Record {
            id: Some(self.0.id.clone()),
            data: self.0.fields.borrow().clone(),
        }
    }

    pub fn info(&self) -> EntityInfo {
        EntityInfo {
            id: self.0.id.clone(),
            components: self.component_names(),
        }
    }

    fn index_table(&self) -> Result<SharedIndex> {
        if !self.0.registered {
            warn!("write to unknown entity {}", self.0.id);
            return Err(QuarryError::EntityNotFound(self.0.id.to_string()));
        }
        self.0.index.borrow().upgrade().ok_or_else(|| {
            warn!("write to detached entity {}", self.0.id);
            QuarryError::DetachedEntity(self.0.id.to_string())
        })
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityHandle {}

impl Hash for EntityHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHandle")
            .field("id", &self.0.id)
            .field("fields", &self.0.fields.borrow())
            .finish()
    }
}

/// Information about an entity for listings
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    /// The stable entity ID
    pub id: EntityId,
    /// Component names present on this entity
    pub components: Vec<String>,
}
