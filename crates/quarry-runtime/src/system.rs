//! Runtime system trait

use crate::clock::TickContext;
use quarry_core::Result;
use quarry_ecs::Store;

/// A per-tick pass over a store.
///
/// Systems read one or more component indices and mutate entity fields.
/// They should walk indices with `ComponentIndex::iter_rev` whenever the
/// pass may remove the component being iterated.
pub trait System {
    /// Human-readable name for this system
    fn name(&self) -> &str;

    /// Called once when the system is added to a schedule
    fn initialize(&mut self, _store: &mut Store) -> Result<()> {
        Ok(())
    }

    /// Called once per tick
    fn run(&mut self, store: &mut Store, ctx: &TickContext) -> Result<()>;
}
