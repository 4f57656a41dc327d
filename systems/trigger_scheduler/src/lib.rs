#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Decides on every tick whether a new rhythm trigger should fire.
//!
//! Two gates must pass, in order. The drive signal must have moved by more
//! than the change threshold since the last value that passed this gate;
//! a static plateau therefore never fires. Only then is the elapsed time
//! since the previous fire compared against an interval that shrinks
//! linearly from `base_interval` to `min_interval` as drive-A rises.

use std::time::Duration;

use quantum_groove_core::{clamp_unit, DriveSignal};
use tracing::trace;

/// Timing and sensitivity knobs for the scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Interval used when drive-A is at rest.
    pub base_interval: Duration,
    /// Interval used when drive-A is saturated.
    pub min_interval: Duration,
    /// Minimum drive change that counts as fresh input.
    pub change_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(600),
            min_interval: Duration::from_millis(120),
            change_threshold: 0.01,
        }
    }
}

/// Pure system gating simulator passes.
#[derive(Debug)]
pub struct TriggerScheduler {
    config: SchedulerConfig,
    last_trigger_at: Option<Duration>,
    last_observed: DriveSignal,
}

impl TriggerScheduler {
    /// Creates a scheduler that has never fired.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            last_trigger_at: None,
            last_observed: DriveSignal::ZERO,
        }
    }

    /// Interval required between fires for the given drive-A level.
    #[must_use]
    pub fn adjusted_interval(&self, drive_a: f64) -> Duration {
        let base = self.config.base_interval;
        let min = self.config.min_interval.min(base);
        let span = base.saturating_sub(min).as_nanos() as f64;
        let reduction = (span * clamp_unit(drive_a)).round() as u64;
        base.saturating_sub(Duration::from_nanos(reduction)).max(min)
    }

    /// Evaluates both gates at session time `now` and records a fire when they pass.
    pub fn should_fire(&mut self, now: Duration, drive: DriveSignal) -> bool {
        let change = drive.max_change(&self.last_observed);
        if change <= self.config.change_threshold {
            return false;
        }
        self.last_observed = drive;

        let interval = self.adjusted_interval(drive.drive_a());
        if let Some(last) = self.last_trigger_at {
            let elapsed = now.saturating_sub(last);
            if elapsed < interval {
                trace!(?elapsed, ?interval, "holding trigger until interval elapses");
                return false;
            }
        }

        self.last_trigger_at = Some(now);
        true
    }

    /// Session time of the most recent fire.
    #[must_use]
    pub const fn last_trigger_at(&self) -> Option<Duration> {
        self.last_trigger_at
    }

    /// Forgets the fire history and the last observed drive.
    pub fn reset(&mut self) {
        self.last_trigger_at = None;
        self.last_observed = DriveSignal::ZERO;
    }
}
