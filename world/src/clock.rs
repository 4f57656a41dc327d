//! Monotonic session clock driven by tick commands.

use std::time::Duration;

/// Accumulates clamped tick durations into a session timeline.
#[derive(Clone, Debug)]
pub(crate) struct SessionClock {
    elapsed: Duration,
    tick_index: u64,
    max_tick: Duration,
}

impl SessionClock {
    /// Creates a clock at time zero that clamps ticks to `max_tick`.
    pub(crate) fn new(max_tick: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            tick_index: 0,
            max_tick,
        }
    }

    /// Advances by `dt`, returning the tick start time and the clamped step.
    pub(crate) fn advance(&mut self, dt: Duration) -> (Duration, Duration) {
        let step = dt.min(self.max_tick);
        let start = self.elapsed;
        self.elapsed = self.elapsed.saturating_add(step);
        self.tick_index = self.tick_index.saturating_add(1);
        (start, step)
    }

    /// Total time covered by processed ticks.
    pub(crate) const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of processed ticks.
    pub(crate) const fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Rewinds to time zero.
    pub(crate) fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.tick_index = 0;
    }
}
