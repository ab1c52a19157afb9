//! Component indices: component name -> entities currently carrying it

use crate::entity::EntityHandle;
use log::trace;
use quarry_core::RemovalPolicy;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub(crate) type SharedIndex = Rc<RefCell<IndexTable>>;

/// Store-owned index collections.
///
/// Each collection holds handles in insertion order with no duplicates.
/// Collections are created lazily and stay in place once emptied.
#[derive(Debug, Default)]
pub(crate) struct IndexTable {
    collections: HashMap<String, Vec<EntityHandle>>,
    policy: RemovalPolicy,
}

impl IndexTable {
    pub(crate) fn new(policy: RemovalPolicy) -> Self {
        Self {
            collections: HashMap::new(),
            policy,
        }
    }

    /// Append `handle` to `component`'s collection unless already present.
    /// Returns true if the handle was appended.
    pub(crate) fn insert(&mut self, component: &str, handle: &EntityHandle) -> bool {
        let members = self.collections.entry(component.to_string()).or_default();
        if members.iter().any(|member| member.ptr_eq(handle)) {
            return false;
        }
        members.push(handle.clone());
        trace!("index '{}' += {} ({} members)", component, handle.id(), members.len());
        true
    }

    /// Remove `handle` from `component`'s collection if present.
    /// Returns true if the handle was removed.
    pub(crate) fn remove(&mut self, component: &str, handle: &EntityHandle) -> bool {
        let Some(members) = self.collections.get_mut(component) else {
            return false;
        };
        let Some(position) = members.iter().position(|member| member.ptr_eq(handle)) else {
            return false;
        };
        match self.policy {
            RemovalPolicy::Ordered => {
                members.remove(position);
            }
            RemovalPolicy::Swap => {
                members.swap_remove(position);
            }
        }
        trace!("index '{}' -= {} ({} members)", component, handle.id(), members.len());
        true
    }

    pub(crate) fn members(&self, component: &str) -> &[EntityHandle] {
        self.collections
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn clear(&mut self) {
        self.collections.clear();
    }
}

/// A live view of one component's index collection.
///
/// The view reads through to the store on every call and never holds a
/// borrow between calls, so entities may be mutated while a view (or one of
/// its iterators) is in use. It is not a snapshot: use [`ComponentIndex::to_vec`]
/// for that.
#[derive(Clone)]
pub struct ComponentIndex {
    table: SharedIndex,
    component: String,
}

impl ComponentIndex {
    pub(crate) fn new(table: SharedIndex, component: impl Into<String>) -> Self {
        Self {
            table,
            component: component.into(),
        }
    }

    /// The component this view indexes
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.table.borrow().members(&self.component).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle at `position`, in insertion order
    pub fn get(&self, position: usize) -> Option<EntityHandle> {
        self.table.borrow().members(&self.component).get(position).cloned()
    }

    pub fn contains(&self, handle: &EntityHandle) -> bool {
        self.table
            .borrow()
            .members(&self.component)
            .iter()
            .any(|member| member.ptr_eq(handle))
    }

    /// Detached copy of the current members
    pub fn to_vec(&self) -> Vec<EntityHandle> {
        self.table.borrow().members(&self.component).to_vec()
    }

    /// Iterate from the last member to the first.
    ///
    /// The collection is re-read at every step and no member is yielded
    /// twice. Any number of members may lose this component mid-iteration,
    /// the visited one included: every member present at the start and
    /// still present when the cursor reaches it is visited exactly once.
    /// Members appended during iteration are not guaranteed to be visited.
    pub fn iter_rev(&self) -> RevIter {
        RevIter {
            view: self.clone(),
            cursor: self.len(),
            visited: HashSet::new(),
        }
    }
}

impl std::fmt::Debug for ComponentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentIndex")
            .field("component", &self.component)
            .field("len", &self.len())
            .finish()
    }
}

/// Reverse cursor over a [`ComponentIndex`]
pub struct RevIter {
    view: ComponentIndex,
    cursor: usize,
    visited: HashSet<EntityHandle>,
}

impl Iterator for RevIter {
    type Item = EntityHandle;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Several members may have left since the last step.
            self.cursor = self.cursor.min(self.view.len());
            if self.cursor == 0 {
                return None;
            }
            self.cursor -= 1;
            let handle = self.view.get(self.cursor)?;
            // Earlier members left, shifting a visited one under the cursor
            if !self.visited.insert(handle.clone()) {
                continue;
            }
            return Some(handle);
        }
    }
}
