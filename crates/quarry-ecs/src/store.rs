//! Store - entity table plus live component indices

use crate::entity::EntityHandle;
use crate::index::{ComponentIndex, IndexTable, SharedIndex};
use crate::record::{Patch, Record};
use indexmap::IndexMap;
use log::{debug, trace};
use quarry_core::{EntityId, IdGenerator, QuarryError, Result, StoreConfig, ID_FIELD};
use std::cell::RefCell;
use std::rc::Rc;

/// The entity-component store
///
/// Owns:
/// - The entity table: id -> handle, in creation order
/// - The component index: component name -> handles carrying it
/// - The id generator used by bulk adds
///
/// Handles point back into the index table but never own it. Dropping the
/// store detaches every outstanding handle.
pub struct Store {
    entities: IndexMap<EntityId, EntityHandle>,
    index: SharedIndex,
    ids: IdGenerator,
    config: StoreConfig,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store with the default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            entities: IndexMap::new(),
            index: Rc::new(RefCell::new(IndexTable::new(config.removal))),
            ids: IdGenerator::new(config.id_prefix.clone()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve an id to its handle.
    ///
    /// With `auto_create` enabled (the default) an unknown id silently
    /// creates an empty entity, so a typo in calling code materialises a new
    /// entity rather than failing. With it disabled, an unknown id yields a
    /// handle that is not stored and whose writes fail with `EntityNotFound`. Use
    /// [`Store::find`] for a lookup that never creates.
    pub fn get(&mut self, id: impl Into<EntityId>) -> EntityHandle {
        let id = id.into();
        if self.config.auto_create {
            return self.get_or_create(id);
        }
        match self.entities.get(&id) {
            Some(handle) => handle.clone(),
            None => EntityHandle::unregistered(id),
        }
    }

    /// Look up an existing entity without creating it
    pub fn find(&self, id: &str) -> Option<EntityHandle> {
        self.entities.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Apply a patch to an entity, creating it if needed.
    ///
    /// `id` entries are skipped; `None` values clear fields.
    pub fn assign(&mut self, id: impl Into<EntityId>, patch: impl Into<Patch>) -> Result<EntityHandle> {
        let handle = self.get_or_create(id.into());
        for (key, value) in patch.into().into_entries() {
            if key == ID_FIELD {
                continue;
            }
            handle.write(&key, value)?;
        }
        Ok(handle)
    }

    /// Remove an entity and purge it from every index it is in.
    ///
    /// Returns the now-detached handle, or `EntityNotFound`.
    pub fn remove(&mut self, id: &str) -> Result<EntityHandle> {
        let handle = self
            .entities
            .shift_remove(id)
            .ok_or_else(|| QuarryError::EntityNotFound(id.to_string()))?;

        {
            let mut index = self.index.borrow_mut();
            for component in handle.component_names() {
                index.remove(&component, &handle);
            }
        }
        handle.detach();

        debug!("removed entity {}", handle.id());
        Ok(handle)
    }

    /// Add records as entities, returning the id used for each, in order.
    ///
    /// Records without an id get one from the generator. The generator
    /// advances once per non-empty call. A record whose id already exists is
    /// merged into that entity.
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) -> Result<Vec<EntityId>> {
        let records: Vec<Record> = records.into_iter().collect();
        let Some(batch) = self.ids.begin_batch(records.len()) else {
            return Ok(Vec::new());
        };
        let ids: Vec<EntityId> = records
            .iter()
            .enumerate()
            .map(|(i, record)| record.id().cloned().unwrap_or_else(|| batch.id_for(i)))
            .collect();

        for (id, record) in ids.iter().zip(records) {
            self.assign(id.clone(), record)?;
        }

        debug!("added {} entities ({} total)", ids.len(), self.entities.len());
        Ok(ids)
    }

    /// Remove the entities named by `records`, returning detached copies of
    /// the records as given. Records without an id, or with an unknown id,
    /// are copied but otherwise skipped.
    pub fn delete(&mut self, records: &[Record]) -> Vec<Record> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(record.clone());
            let Some(id) = record.id() else {
                continue;
            };
            if let Err(err) = self.remove(id.as_str()) {
                trace!("delete skipped: {}", err);
            }
        }
        out
    }

    /// Live view of the entities carrying `component`.
    ///
    /// Empty if the component was never assigned.
    pub fn index_of(&self, component: &str) -> ComponentIndex {
        ComponentIndex::new(Rc::clone(&self.index), component)
    }

    /// Number of entities currently carrying `component`
    pub fn index_len(&self, component: &str) -> usize {
        self.index.borrow().members(component).len()
    }

    /// Components that have ever had an index collection, sorted
    pub fn component_names(&self) -> Vec<String> {
        self.index.borrow().component_names()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// Entity handles in creation order
    pub fn entities(&self) -> impl Iterator<Item = &EntityHandle> {
        self.entities.values()
    }

    /// Remove every entity and index collection. The id generator keeps
    /// counting so later ids never repeat earlier ones.
    pub fn clear(&mut self) {
        for handle in self.entities.values() {
            handle.detach();
        }
        self.entities.clear();
        self.index.borrow_mut().clear();
    }

    fn get_or_create(&mut self, id: EntityId) -> EntityHandle {
        if let Some(handle) = self.entities.get(&id) {
            return handle.clone();
        }
        trace!("creating entity {}", id);
        let handle = EntityHandle::attached(id.clone(), &self.index);
        self.entities.insert(id, handle.clone());
        handle
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entities", &self.entities.len())
            .field("components", &self.component_names())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{RemovalPolicy, Value};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ids_of(index: &ComponentIndex) -> Vec<String> {
        index.to_vec().iter().map(|h| h.id().to_string()).collect()
    }

    #[test]
    fn test_add_and_delete_field_scenario() {
        let mut store = Store::new();
        let ids = store
            .add([
                Record::new().with("speed", 1i64),
                Record::new().with("speed", 2i64),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);

        let speed = store.index_of("speed");
        assert_eq!(ids_of(&speed), vec![ids[0].to_string(), ids[1].to_string()]);

        store.get(ids[0].clone()).delete("speed").unwrap();
        assert_eq!(speed.len(), 1);
        assert_eq!(speed.get(0).unwrap().id(), &ids[1]);
    }

    #[test]
    fn test_get_unknown_id_creates_empty_entity() {
        let mut store = Store::new();
        let handle = store.get("x");

        assert_eq!(handle.get("id"), Some(Value::String("x".into())));
        assert!(handle.component_names().is_empty());
        assert!(store.component_names().is_empty());
        assert!(store.contains("x"));
    }

    #[test]
    fn test_get_without_auto_create() {
        let mut store = Store::with_config(StoreConfig {
            auto_create: false,
            ..StoreConfig::default()
        });
        let handle = store.get("ghost");

        assert!(!store.contains("ghost"));
        assert!(!handle.is_attached());
        assert!(matches!(
            handle.set("hp", 3i64),
            Err(QuarryError::EntityNotFound(_))
        ));
        assert!(matches!(
            handle.delete("hp"),
            Err(QuarryError::EntityNotFound(_))
        ));
        assert_eq!(store.index_len("hp"), 0);

        // Writes through the store still create
        store.assign("ghost", Patch::new().set("hp", 3i64)).unwrap();
        assert_eq!(store.index_len("hp"), 1);
    }

    #[test]
    fn test_handle_identity_is_stable() {
        let mut store = Store::new();
        let a = store.get("a");
        let b = store.get("a");
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, store.get("b"));
    }

    #[test]
    fn test_id_is_immutable() {
        let mut store = Store::new();
        let handle = store.get("a");

        assert!(matches!(
            handle.set("id", "b"),
            Err(QuarryError::ImmutableField(_))
        ));
        assert!(matches!(
            handle.delete("id"),
            Err(QuarryError::ImmutableField(_))
        ));
        assert_eq!(handle.id().as_str(), "a");
        assert!(store.component_names().is_empty());
        assert!(store.find("b").is_none());
    }

    #[test]
    fn test_repeated_writes_do_not_duplicate() {
        let mut store = Store::new();
        let handle = store.get("a");
        for _ in 0..3 {
            handle.set("speed", 5i64).unwrap();
        }
        handle.set("speed", 6i64).unwrap();
        assert_eq!(store.index_len("speed"), 1);
        assert_eq!(handle.get("speed"), Some(Value::Integer(6)));
    }

    #[test]
    fn test_deleting_absent_field_is_noop() {
        let mut store = Store::new();
        let a = store.get("a");
        let b = store.get("b");
        b.set("tag", true).unwrap();

        a.delete("tag").unwrap();
        a.delete("never").unwrap();

        assert_eq!(ids_of(&store.index_of("tag")), vec!["b"]);
        assert!(store.index_of("never").is_empty());
    }

    #[test]
    fn test_batch_ids() {
        let mut store = Store::new();
        let pair = store.add([Record::new(), Record::new()]).unwrap();
        assert_eq!(pair[0].as_str(), "auto-generated 0.0");
        assert_eq!(pair[1].as_str(), "auto-generated 0.1");

        let first = store.add([Record::new()]).unwrap();
        let second = store.add([Record::new()]).unwrap();
        assert_eq!(first[0].as_str(), "auto-generated 1");
        assert_eq!(second[0].as_str(), "auto-generated 2");
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_add_keeps_supplied_ids_and_counts_call() {
        let mut store = Store::new();
        let ids = store
            .add([Record::with_id("ball"), Record::new().with("size", 2i64)])
            .unwrap();
        assert_eq!(ids[0].as_str(), "ball");
        assert_eq!(ids[1].as_str(), "auto-generated 0.1");

        let next = store.add([Record::new()]).unwrap();
        assert_eq!(next[0].as_str(), "auto-generated 1");
    }

    #[test]
    fn test_empty_add_is_noop() {
        let mut store = Store::new();
        assert!(store.add(Vec::new()).unwrap().is_empty());
        assert!(store.is_empty());

        let ids = store.add([Record::new()]).unwrap();
        assert_eq!(ids[0].as_str(), "auto-generated 0");
    }

    #[test]
    fn test_add_existing_id_merges() {
        let mut store = Store::new();
        store.add([Record::with_id("a").with("x", 1i64)]).unwrap();
        store.add([Record::with_id("a").with("y", 2i64)]).unwrap();

        let a = store.find("a").unwrap();
        assert!(a.has("x") && a.has("y"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.index_len("x"), 1);
    }

    #[test]
    fn test_assign_clears_and_sets() {
        let mut store = Store::new();
        store
            .assign("a", Patch::new().set("hp", 10i64).set("shield", true))
            .unwrap();
        let a = store
            .assign("a", Patch::new().clear("shield").set("id", "other"))
            .unwrap();

        assert_eq!(a.id().as_str(), "a");
        assert!(!a.has("shield"));
        assert!(store.index_of("shield").is_empty());
        assert_eq!(store.index_len("hp"), 1);
    }

    #[test]
    fn test_remove_purges_all_indices() {
        let mut store = Store::new();
        store
            .add([
                Record::with_id("a").with("p", 1i64).with("q", 1i64),
                Record::with_id("b").with("p", 2i64),
            ])
            .unwrap();

        let removed = store.remove("a").unwrap();
        assert!(!removed.is_attached());
        assert!(!store.index_of("p").contains(&removed));
        assert!(!store.index_of("q").contains(&removed));
        assert_eq!(ids_of(&store.index_of("p")), vec!["b"]);
        assert!(!store.contains("a"));

        // The removed handle can no longer reach the indices
        assert!(matches!(
            removed.set("p", 3i64),
            Err(QuarryError::DetachedEntity(_))
        ));
        assert_eq!(store.index_len("p"), 1);
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let mut store = Store::new();
        assert!(matches!(
            store.remove("missing"),
            Err(QuarryError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_bulk_delete_returns_detached_copies() {
        let mut store = Store::new();
        store
            .add([
                Record::with_id("a").with("p", 1i64),
                Record::with_id("b").with("p", 2i64),
            ])
            .unwrap();

        let input = vec![
            Record::with_id("a"),
            Record::with_id("missing").with("note", "kept"),
            Record::new(),
        ];
        let mut out = store.delete(&input);

        assert_eq!(out, input);
        assert_eq!(store.len(), 1);
        assert_eq!(ids_of(&store.index_of("p")), vec!["b"]);

        out[0].set("p", 99i64);
        assert_eq!(store.index_len("p"), 1);
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_reverse_iteration_survives_self_removal() {
        let mut store = Store::new();
        let records: Vec<Record> = (0..6).map(|i| Record::new().with("timeout", i as i64)).collect();
        store.add(records).unwrap();

        let mut visited = Vec::new();
        for entity in store.index_of("timeout").iter_rev() {
            visited.push(entity.id().to_string());
            let expired = entity
                .get("timeout")
                .and_then(|v| v.as_integer())
                .is_some_and(|t| t % 2 == 0);
            if expired {
                entity.delete("timeout").unwrap();
            }
        }

        let mut unique = visited.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(visited.len(), 6);
        assert_eq!(unique.len(), 6);
        assert_eq!(store.index_len("timeout"), 3);
    }

    #[test]
    fn test_swap_removal_policy() {
        let mut store = Store::with_config(StoreConfig {
            removal: RemovalPolicy::Swap,
            ..StoreConfig::default()
        });
        for id in ["a", "b", "c", "d"] {
            store.assign(id, Patch::new().set("k", true)).unwrap();
        }
        store.get("a").delete("k").unwrap();
        assert_eq!(ids_of(&store.index_of("k")), vec!["d", "b", "c"]);
    }

    #[test]
    fn test_update_in_place_keeps_index() {
        let mut store = Store::new();
        let ids = store
            .add([Record::new().with("position", Value::Array(vec![0.0.into(), 0.0.into()]))])
            .unwrap();
        let entity = store.find(ids[0].as_str()).unwrap();

        let moved = entity.update("position", |pos| {
            if let Some(arr) = pos.as_array_mut() {
                arr[0] = Value::Float(4.0);
            }
        });
        assert!(moved.is_some());
        assert!(entity.update("velocity", |_| ()).is_none());
        assert_eq!(
            entity.get("position").and_then(|p| p.as_array().map(|a| a[0].clone())),
            Some(Value::Float(4.0))
        );
        assert_eq!(store.index_len("position"), 1);
    }

    #[test]
    fn test_update_closure_reads_same_handle() {
        let mut store = Store::new();
        let entity = store
            .assign(
                "ball",
                Patch::new().set("position", 1.0).set("velocity", 0.5),
            )
            .unwrap();

        let result = entity.update("position", |pos| {
            let velocity = entity.get("velocity").and_then(|v| v.as_float()).unwrap();
            let current = entity.get("position").and_then(|v| v.as_float()).unwrap();
            *pos = Value::Float(current + velocity);
        });

        assert!(result.is_some());
        assert_eq!(entity.get("position"), Some(Value::Float(1.5)));
    }

    #[test]
    fn test_update_discarded_when_closure_deletes_field() {
        let mut store = Store::new();
        let entity = store.assign("a", Patch::new().set("hp", 3i64)).unwrap();

        let result = entity.update("hp", |hp| {
            *hp = Value::Integer(0);
            entity.delete("hp").unwrap();
        });

        assert!(result.is_some());
        assert!(!entity.has("hp"));
        assert_eq!(store.index_len("hp"), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = Store::new();
        let a = store.assign("a", Patch::new().set("hp", 1i64)).unwrap();
        let mut snap = a.snapshot();
        snap.set("hp", 100i64);

        assert_eq!(a.get("hp"), Some(Value::Integer(1)));
        assert_eq!(snap.id().map(|id| id.as_str()), Some("a"));
    }

    #[test]
    fn test_clear_detaches_handles() {
        let mut store = Store::new();
        let a = store.assign("a", Patch::new().set("hp", 1i64)).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert!(store.component_names().is_empty());
        assert!(!a.is_attached());

        let ids = store.add([Record::new()]).unwrap();
        assert_eq!(ids[0].as_str(), "auto-generated 0");
    }

    #[test]
    fn test_dropped_store_detaches_handles() {
        let handle = {
            let mut store = Store::new();
            store.get("a")
        };
        assert!(matches!(
            handle.set("hp", 1i64),
            Err(QuarryError::DetachedEntity(_))
        ));
    }

    #[test]
    fn test_randomized_index_consistency() {
        const KEYS: [&str; 4] = ["a", "b", "c", "d"];
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut store = Store::new();
        let handles: Vec<EntityHandle> = (0..8).map(|i| store.get(format!("e{i}"))).collect();

        for step in 0..2_000 {
            let handle = &handles[rng.gen_range(0..handles.len())];
            let key = KEYS[rng.gen_range(0..KEYS.len())];
            if rng.gen_bool(0.5) {
                handle.set(key, step as i64).unwrap();
            } else {
                handle.delete(key).unwrap();
            }

            for key in KEYS {
                let index = store.index_of(key);
                let members = index.to_vec();
                for h in &handles {
                    let count = members.iter().filter(|m| m.ptr_eq(h)).count();
                    assert_eq!(count, usize::from(h.has(key)), "step {step} key {key}");
                }
            }
        }
    }
}
