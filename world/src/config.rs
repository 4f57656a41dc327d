//! Session configuration loaded from TOML.

use std::time::Duration;

use quantum_groove_system_parameter_blend::PresetTable;
use quantum_groove_system_signal_tracker::TrackerConfig;
use quantum_groove_system_trigger_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seed used when the configuration does not provide one.
pub const DEFAULT_RNG_SEED: u64 = 0x51ab_c0de_7e57_0001;

/// Rejected configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be deserialized.
    #[error("failed to parse session configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Pointer speed must be a positive finite number.
    #[error("tracker.max_pointer_speed must be positive, got {0}")]
    PointerSpeed(f64),
    /// Speed exponent must exceed one.
    #[error("tracker.speed_exponent must be greater than 1, got {0}")]
    SpeedExponent(f64),
    /// Key step must lie in `(0, 1]`.
    #[error("tracker.key_step must lie in (0, 1], got {0}")]
    KeyStep(f64),
    /// Key decay must lie strictly inside `(0, 1)`.
    #[error("tracker.key_decay must lie strictly between 0 and 1, got {0}")]
    KeyDecay(f64),
    /// At least one concurrent key is required to saturate complexity.
    #[error("tracker.max_concurrent_keys must be at least 1")]
    ConcurrentKeys,
    /// The base interval must be non-zero.
    #[error("scheduler.base_interval_ms must be positive")]
    BaseInterval,
    /// The minimum interval exceeds the base interval.
    #[error("scheduler.min_interval_ms ({min}) exceeds scheduler.base_interval_ms ({base})")]
    IntervalOrder {
        /// Configured minimum interval in milliseconds.
        min: u64,
        /// Configured base interval in milliseconds.
        base: u64,
    },
    /// The change threshold must be finite and non-negative.
    #[error("scheduler.change_threshold must be finite and non-negative, got {0}")]
    ChangeThreshold(f64),
    /// Tick clamping requires a non-zero ceiling.
    #[error("max_tick_ms must be positive")]
    MaxTick,
}

/// Signal-tracker tuning as it appears in the configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Pointer displacement per tick, in pixels, that saturates drive-A input.
    pub max_pointer_speed: f64,
    /// Exponent applied to the normalised displacement.
    pub speed_exponent: f64,
    /// Activity added per key-down.
    pub key_step: f64,
    /// Per-tick multiplicative decay of key activity.
    pub key_decay: f64,
    /// Held keys that saturate the complexity term.
    pub max_concurrent_keys: u32,
}

impl Default for TrackerSection {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        Self {
            max_pointer_speed: tracker.max_pointer_speed,
            speed_exponent: tracker.speed_exponent,
            key_step: tracker.key_step,
            key_decay: tracker.key_decay,
            max_concurrent_keys: tracker.max_concurrent_keys,
        }
    }
}

impl TrackerSection {
    /// Converts the section into the tracker's own configuration.
    #[must_use]
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_pointer_speed: self.max_pointer_speed,
            speed_exponent: self.speed_exponent,
            key_step: self.key_step,
            key_decay: self.key_decay,
            max_concurrent_keys: self.max_concurrent_keys,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_pointer_speed.is_finite() && self.max_pointer_speed > 0.0) {
            return Err(ConfigError::PointerSpeed(self.max_pointer_speed));
        }
        if !(self.speed_exponent.is_finite() && self.speed_exponent > 1.0) {
            return Err(ConfigError::SpeedExponent(self.speed_exponent));
        }
        if !(self.key_step > 0.0 && self.key_step <= 1.0) {
            return Err(ConfigError::KeyStep(self.key_step));
        }
        if !(self.key_decay > 0.0 && self.key_decay < 1.0) {
            return Err(ConfigError::KeyDecay(self.key_decay));
        }
        if self.max_concurrent_keys == 0 {
            return Err(ConfigError::ConcurrentKeys);
        }
        Ok(())
    }
}

/// Trigger-scheduler timing as it appears in the configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Interval between fires with drive-A at rest, in milliseconds.
    pub base_interval_ms: u64,
    /// Interval between fires with drive-A saturated, in milliseconds.
    pub min_interval_ms: u64,
    /// Minimum drive change that counts as fresh input.
    pub change_threshold: f64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let scheduler = SchedulerConfig::default();
        Self {
            base_interval_ms: scheduler.base_interval.as_millis() as u64,
            min_interval_ms: scheduler.min_interval.as_millis() as u64,
            change_threshold: scheduler.change_threshold,
        }
    }
}

impl SchedulerSection {
    /// Converts the section into the scheduler's own configuration.
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            base_interval: Duration::from_millis(self.base_interval_ms),
            min_interval: Duration::from_millis(self.min_interval_ms),
            change_threshold: self.change_threshold,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_interval_ms == 0 {
            return Err(ConfigError::BaseInterval);
        }
        if self.min_interval_ms > self.base_interval_ms {
            return Err(ConfigError::IntervalOrder {
                min: self.min_interval_ms,
                base: self.base_interval_ms,
            });
        }
        if !(self.change_threshold.is_finite() && self.change_threshold >= 0.0) {
            return Err(ConfigError::ChangeThreshold(self.change_threshold));
        }
        Ok(())
    }
}

/// Complete configuration of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed of the collapse draw and of the built-in melody model.
    #[serde(default = "SessionConfig::default_rng_seed")]
    pub rng_seed: u64,
    /// Ticks longer than this many milliseconds are clamped.
    #[serde(default = "SessionConfig::default_max_tick_ms")]
    pub max_tick_ms: u64,
    /// Whether the built-in generative melody model is enabled.
    #[serde(default = "SessionConfig::default_generative_melody")]
    pub generative_melody: bool,
    /// Signal-tracker tuning.
    #[serde(default)]
    pub tracker: TrackerSection,
    /// Trigger-scheduler timing.
    #[serde(default)]
    pub scheduler: SchedulerSection,
    /// Presets blended by drive-B.
    #[serde(default)]
    pub presets: PresetTable,
}

impl SessionConfig {
    fn default_rng_seed() -> u64 {
        DEFAULT_RNG_SEED
    }

    fn default_max_tick_ms() -> u64 {
        250
    }

    fn default_generative_melody() -> bool {
        true
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.scheduler.validate()?;
        if self.max_tick_ms == 0 {
            return Err(ConfigError::MaxTick);
        }
        Ok(())
    }

    /// Upper bound applied to a single tick.
    #[must_use]
    pub fn max_tick(&self) -> Duration {
        Duration::from_millis(self.max_tick_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rng_seed: Self::default_rng_seed(),
            max_tick_ms: Self::default_max_tick_ms(),
            generative_melody: Self::default_generative_melody(),
            tracker: TrackerSection::default(),
            scheduler: SchedulerSection::default(),
            presets: PresetTable::default(),
        }
    }
}
