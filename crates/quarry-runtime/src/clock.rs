//! Deterministic fixed-step tick clock

/// Timing information handed to systems each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Time since the previous tick in milliseconds
    pub delta: f64,
    /// Total elapsed time in milliseconds
    pub time: f64,
    /// Zero-based tick number
    pub tick: u64,
}

/// Advances simulated time by a fixed step per tick.
///
/// Unlike a wall-clock loop this never reads the system time, so runs with
/// the same step and tick count are reproducible.
#[derive(Debug, Clone)]
pub struct TickClock {
    /// Step length in milliseconds
    pub step: f64,
    elapsed: f64,
    ticks: u64,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::with_rate(60.0)
    }
}

impl TickClock {
    /// Create a clock with the default 60Hz step
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock ticking `hz` times per simulated second
    pub fn with_rate(hz: f64) -> Self {
        Self {
            step: 1000.0 / hz,
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Advance one step and return the context for that tick
    pub fn advance(&mut self) -> TickContext {
        self.advance_by(self.step)
    }

    /// Advance by an explicit delta (milliseconds). Negative deltas clamp to zero.
    pub fn advance_by(&mut self, delta: f64) -> TickContext {
        let delta = delta.max(0.0);
        self.elapsed += delta;
        let ctx = TickContext {
            delta,
            time: self.elapsed,
            tick: self.ticks,
        };
        self.ticks += 1;
        ctx
    }

    /// Total elapsed time in milliseconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
