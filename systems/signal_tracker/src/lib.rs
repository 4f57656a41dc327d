#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Signal tracker that turns raw pointer and key activity into drive signals.
//!
//! The tracker is the single point of entry for untrusted input. Pointer
//! coordinates that are not finite are discarded and both drives are clamped
//! into the unit interval before they leave the crate, so downstream systems
//! never observe NaN or out-of-range values.

use std::collections::BTreeSet;

use quantum_groove_core::{clamp_unit, DriveSignal};
use tracing::trace;

const DRIVE_A_RETAIN: f64 = 0.8;
const DRIVE_A_INPUT: f64 = 0.2;
const DRIVE_B_RETAIN: f64 = 0.7;
const DRIVE_B_INPUT: f64 = 0.3;
const COMPONENT_WEIGHT: f64 = 0.5;

/// Tuning knobs controlling how raw input is shaped into drives.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Pointer displacement per tick that saturates the frequency factor.
    pub max_pointer_speed: f64,
    /// Exponent applied to the normalised displacement; values above one emphasise fast motion.
    pub speed_exponent: f64,
    /// Activity added by every key-down event.
    pub key_step: f64,
    /// Multiplicative decay applied to key activity every tick.
    pub key_decay: f64,
    /// Number of simultaneously held keys that saturates the complexity term.
    pub max_concurrent_keys: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_pointer_speed: 40.0,
            speed_exponent: 1.5,
            key_step: 0.2,
            key_decay: 0.95,
            max_concurrent_keys: 5,
        }
    }
}

/// Pure system that smooths raw input into a [`DriveSignal`] once per tick.
#[derive(Debug)]
pub struct SignalTracker {
    config: TrackerConfig,
    pointer: Option<(f64, f64)>,
    previous_pointer: Option<(f64, f64)>,
    held_keys: BTreeSet<char>,
    key_activity: f64,
    drive: DriveSignal,
}

impl SignalTracker {
    /// Creates a tracker at rest using the supplied configuration.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            pointer: None,
            previous_pointer: None,
            held_keys: BTreeSet::new(),
            key_activity: 0.0,
            drive: DriveSignal::ZERO,
        }
    }

    /// Records the latest pointer position, ignoring non-finite coordinates.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            trace!(x, y, "discarding non-finite pointer sample");
            return;
        }
        self.pointer = Some((x, y));
    }

    /// Registers a key-down event for a printable key.
    pub fn key_pressed(&mut self, key: char) {
        if key.is_control() {
            return;
        }
        let _ = self.held_keys.insert(key);
        self.key_activity = (self.key_activity + self.config.key_step).min(1.0);
    }

    /// Registers a key-up event.
    pub fn key_released(&mut self, key: char) {
        let _ = self.held_keys.remove(&key);
    }

    /// Advances the tracker by one tick and returns the new drive signal.
    pub fn update(&mut self) -> DriveSignal {
        let displacement = match (self.previous_pointer, self.pointer) {
            (Some((px, py)), Some((x, y))) => (x - px).hypot(y - py),
            _ => 0.0,
        };
        self.previous_pointer = self.pointer;

        let frequency_factor = self.frequency_factor(displacement);
        let drive_a = self.drive.drive_a() * DRIVE_A_RETAIN + frequency_factor * DRIVE_A_INPUT;

        self.key_activity = clamp_unit(self.key_activity * self.config.key_decay);
        let complexity = self.complexity() * COMPONENT_WEIGHT;
        let activity = self.key_activity * COMPONENT_WEIGHT;
        let drive_b =
            self.drive.drive_b() * DRIVE_B_RETAIN + (complexity + activity) * DRIVE_B_INPUT;

        self.drive = DriveSignal::new(drive_a, drive_b);
        self.drive
    }

    /// Most recent drive signal produced by [`SignalTracker::update`].
    #[must_use]
    pub fn drive(&self) -> DriveSignal {
        self.drive
    }

    /// Current decaying key-activity level.
    #[must_use]
    pub fn key_activity(&self) -> f64 {
        self.key_activity
    }

    /// Number of keys currently held down.
    #[must_use]
    pub fn held_key_count(&self) -> usize {
        self.held_keys.len()
    }

    /// Returns the tracker to its initial resting state.
    pub fn reset(&mut self) {
        self.pointer = None;
        self.previous_pointer = None;
        self.held_keys.clear();
        self.key_activity = 0.0;
        self.drive = DriveSignal::ZERO;
    }

    fn frequency_factor(&self, displacement: f64) -> f64 {
        if self.config.max_pointer_speed <= 0.0 {
            return 0.0;
        }
        clamp_unit(displacement / self.config.max_pointer_speed).powf(self.config.speed_exponent)
    }

    fn complexity(&self) -> f64 {
        if self.config.max_concurrent_keys == 0 {
            return 0.0;
        }
        let held = self.held_keys.len() as f64;
        (held / f64::from(self.config.max_concurrent_keys)).min(1.0)
    }
}
