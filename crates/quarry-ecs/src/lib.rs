//! Quarry ECS - in-memory entity-component store
//!
//! Entities are loosely-typed records keyed by a stable id. For every
//! component name ever assigned, the store keeps a live index of the
//! entities that currently carry it, so systems iterate `index_of(name)`
//! instead of scanning all entities.
//!
//! Every field write goes through an [`EntityHandle`], which keeps the
//! indices in step with entity state.

mod entity;
mod index;
mod record;
mod store;

pub use entity::{EntityHandle, EntityInfo};
pub use index::{ComponentIndex, RevIter};
pub use record::{Patch, Record};
pub use store::Store;
