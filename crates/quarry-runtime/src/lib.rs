//! Quarry Runtime - per-tick driving loop
//!
//! Provides the building blocks for code that drives a store once per tick:
//! - `TickClock` - deterministic fixed-step clock
//! - `System` - trait for per-tick passes over component indices
//! - `Schedule` - ordered list of systems run against one store

mod clock;
mod schedule;
mod system;

pub use clock::{TickClock, TickContext};
pub use schedule::Schedule;
pub use system::System;
