//! Ordered system schedule

use crate::clock::{TickClock, TickContext};
use crate::system::System;
use log::{debug, error};
use quarry_core::Result;
use quarry_ecs::Store;

/// Systems run in registration order, once per tick
#[derive(Default)]
pub struct Schedule {
    systems: Vec<Box<dyn System>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system, running its `initialize` hook against `store`
    pub fn add_system(&mut self, store: &mut Store, mut system: Box<dyn System>) -> Result<()> {
        system.initialize(store)?;
        debug!("registered system '{}'", system.name());
        self.systems.push(system);
        Ok(())
    }

    /// Run every system once. Stops at the first failing system.
    pub fn tick(&mut self, store: &mut Store, ctx: &TickContext) -> Result<()> {
        for system in &mut self.systems {
            if let Err(err) = system.run(store, ctx) {
                error!("system '{}' failed on tick {}: {}", system.name(), ctx.tick, err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Advance `clock` and tick `ticks` times
    pub fn run_for(&mut self, store: &mut Store, clock: &mut TickClock, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            let ctx = clock.advance();
            self.tick(store, &ctx)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in run order
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::QuarryError;
    use quarry_ecs::Record;

    /// Counts down `fuse`; drops the component at zero
    struct Fuse;

    impl System for Fuse {
        fn name(&self) -> &str {
            "fuse"
        }

        fn run(&mut self, store: &mut Store, _ctx: &TickContext) -> Result<()> {
            for entity in store.index_of("fuse").iter_rev() {
                let remaining = entity
                    .update("fuse", |v| {
                        let next = v.as_integer().unwrap_or(0) - 1;
                        *v = next.into();
                        next
                    })
                    .unwrap_or(0);
                if remaining <= 0 {
                    entity.delete("fuse")?;
                    entity.set("exploded", true)?;
                }
            }
            Ok(())
        }
    }

    struct Failing;

    impl System for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&mut self, _store: &mut Store, ctx: &TickContext) -> Result<()> {
            Err(QuarryError::SystemFailed {
                system: "failing".into(),
                message: format!("tick {}", ctx.tick),
            })
        }
    }

    #[test]
    fn test_systems_run_each_tick() {
        let mut store = Store::new();
        store
            .add([
                Record::new().with("fuse", 1i64),
                Record::new().with("fuse", 3i64),
            ])
            .unwrap();

        let mut schedule = Schedule::new();
        schedule.add_system(&mut store, Box::new(Fuse)).unwrap();
        let mut clock = TickClock::new();

        schedule.run_for(&mut store, &mut clock, 1).unwrap();
        assert_eq!(store.index_len("fuse"), 1);
        assert_eq!(store.index_len("exploded"), 1);

        schedule.run_for(&mut store, &mut clock, 2).unwrap();
        assert_eq!(store.index_len("fuse"), 0);
        assert_eq!(store.index_len("exploded"), 2);
        assert_eq!(clock.tick_count(), 3);
    }

    #[test]
    fn test_failure_stops_tick() {
        let mut store = Store::new();
        store.add([Record::new().with("fuse", 5i64)]).unwrap();

        let mut schedule = Schedule::new();
        schedule.add_system(&mut store, Box::new(Failing)).unwrap();
        schedule.add_system(&mut store, Box::new(Fuse)).unwrap();
        assert_eq!(schedule.names(), vec!["failing", "fuse"]);

        let ctx = TickClock::new().advance();
        assert!(matches!(
            schedule.tick(&mut store, &ctx),
            Err(QuarryError::SystemFailed { .. })
        ));
        let fuse = store.index_of("fuse").get(0).unwrap();
        assert_eq!(fuse.get("fuse").and_then(|v| v.as_integer()), Some(5));
    }
}
