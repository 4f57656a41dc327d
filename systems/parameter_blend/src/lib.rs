#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Maps drive values onto tempo, complexity tier, and blended preset parameters.
//!
//! The continuous blend crossfades linearly between three presets: the lower
//! half of the influence range fades `low` into `mid`, the upper half fades
//! `mid` into `high`. The discrete complexity tier is chosen independently
//! from fixed thresholds and selects which pattern table is played.

use quantum_groove_core::{clamp_unit, ComplexityTier, SoundParameters, Tempo};
use serde::{Deserialize, Serialize};

/// Drive-B level below which the simple tier is selected.
pub const SIMPLE_TIER_CEILING: f64 = 0.3;

/// Drive-B level below which the medium tier is selected.
pub const MEDIUM_TIER_CEILING: f64 = 0.7;

/// Tempo span covered by drive-A on top of [`Tempo::MIN`].
const TEMPO_SPAN_BPM: f64 = 80.0;

/// Named presets blended by the parameter blender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Style {
    /// Favoured in the low third of the influence range.
    Low,
    /// Favoured around the middle of the influence range.
    Mid,
    /// Favoured in the high third of the influence range.
    High,
}

impl Style {
    /// Every style in table order.
    pub const ALL: [Style; 3] = [Self::Low, Self::Mid, Self::High];

    /// Lower-case label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

/// Numeric parameters carried by every preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendParameter {
    /// Sampling temperature handed to the melody model.
    Temperature,
    /// Sequencer steps per beat.
    Subdivision,
    /// Low-pass filter cutoff in hertz.
    FilterCutoff,
    /// Delay feedback amount.
    Feedback,
    /// Reverb decay time in seconds.
    ReverbDecay,
}

/// Fixed bundle of numeric parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Sampling temperature handed to the melody model.
    pub temperature: f64,
    /// Sequencer steps per beat.
    pub subdivision: f64,
    /// Low-pass filter cutoff in hertz.
    pub filter_cutoff_hz: f64,
    /// Delay feedback amount.
    pub feedback: f64,
    /// Reverb decay time in seconds.
    pub reverb_decay_secs: f64,
}

impl Preset {
    /// Reads a single parameter from the preset.
    #[must_use]
    pub const fn value(&self, parameter: BlendParameter) -> f64 {
        match parameter {
            BlendParameter::Temperature => self.temperature,
            BlendParameter::Subdivision => self.subdivision,
            BlendParameter::FilterCutoff => self.filter_cutoff_hz,
            BlendParameter::Feedback => self.feedback,
            BlendParameter::ReverbDecay => self.reverb_decay_secs,
        }
    }
}

/// The three presets in `low`, `mid`, `high` order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetTable {
    /// Preset favoured for low influence.
    pub low: Preset,
    /// Preset favoured for mid influence.
    pub mid: Preset,
    /// Preset favoured for high influence.
    pub high: Preset,
}

impl PresetTable {
    /// Preset registered for the provided style.
    #[must_use]
    pub const fn preset(&self, style: Style) -> &Preset {
        match style {
            Style::Low => &self.low,
            Style::Mid => &self.mid,
            Style::High => &self.high,
        }
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self {
            low: Preset {
                temperature: 0.6,
                subdivision: 1.0,
                filter_cutoff_hz: 800.0,
                feedback: 0.1,
                reverb_decay_secs: 4.0,
            },
            mid: Preset {
                temperature: 1.0,
                subdivision: 2.0,
                filter_cutoff_hz: 2_500.0,
                feedback: 0.3,
                reverb_decay_secs: 2.0,
            },
            high: Preset {
                temperature: 1.5,
                subdivision: 4.0,
                filter_cutoff_hz: 8_000.0,
                feedback: 0.6,
                reverb_decay_secs: 1.0,
            },
        }
    }
}

/// Simplex weighting over the three styles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWeights {
    /// Weight of the low preset.
    pub low: f64,
    /// Weight of the mid preset.
    pub mid: f64,
    /// Weight of the high preset.
    pub high: f64,
}

impl BlendWeights {
    /// Derives the piecewise-linear weighting for an influence value.
    #[must_use]
    pub fn for_influence(influence: f64) -> Self {
        let x = clamp_unit(influence);
        let low = (1.0 - 2.0 * x).max(0.0);
        let high = (2.0 * x - 1.0).max(0.0);
        Self {
            low,
            mid: 1.0 - low - high,
            high,
        }
    }

    /// Weight assigned to a style.
    #[must_use]
    pub const fn weight(&self, style: Style) -> f64 {
        match style {
            Style::Low => self.low,
            Style::Mid => self.mid,
            Style::High => self.high,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.low + self.mid + self.high
    }
}

/// Chooses the discrete pattern tier from drive-B.
#[must_use]
pub fn complexity_tier(drive_b: f64) -> ComplexityTier {
    let drive_b = clamp_unit(drive_b);
    if drive_b < SIMPLE_TIER_CEILING {
        ComplexityTier::Simple
    } else if drive_b < MEDIUM_TIER_CEILING {
        ComplexityTier::Medium
    } else {
        ComplexityTier::Complex
    }
}

/// Maps drive-A onto the 80–160 BPM range.
#[must_use]
pub fn tempo_for(drive_a: f64) -> Tempo {
    let offset = (clamp_unit(drive_a) * TEMPO_SPAN_BPM).round() as u16;
    Tempo::new(Tempo::MIN.bpm() + offset)
}

/// Weighted mixture over a fixed preset table.
#[derive(Clone, Debug, Default)]
pub struct ParameterBlender {
    presets: PresetTable,
}

impl ParameterBlender {
    /// Creates a blender over the provided presets.
    #[must_use]
    pub fn new(presets: PresetTable) -> Self {
        Self { presets }
    }

    /// Preset table backing the blend.
    #[must_use]
    pub const fn presets(&self) -> &PresetTable {
        &self.presets
    }

    /// Weighting for an influence value.
    #[must_use]
    pub fn weights(&self, influence: f64) -> BlendWeights {
        BlendWeights::for_influence(influence)
    }

    /// Weighted average of one parameter across the preset table.
    #[must_use]
    pub fn blend(&self, parameter: BlendParameter, influence: f64) -> f64 {
        let weights = self.weights(influence);
        let total = weights.total();
        if total <= 0.0 {
            return self.presets.mid.value(parameter);
        }

        let weighted: f64 = Style::ALL
            .iter()
            .map(|style| self.presets.preset(*style).value(parameter) * weights.weight(*style))
            .sum();
        weighted / total
    }

    /// Sound-engine parameters blended for an influence value.
    #[must_use]
    pub fn sound_parameters(&self, influence: f64) -> SoundParameters {
        SoundParameters {
            filter_cutoff_hz: self.blend(BlendParameter::FilterCutoff, influence),
            feedback: self.blend(BlendParameter::Feedback, influence),
            reverb_decay_secs: self.blend(BlendParameter::ReverbDecay, influence),
        }
    }

    /// Melody-model temperature blended for an influence value.
    #[must_use]
    pub fn temperature(&self, influence: f64) -> f64 {
        self.blend(BlendParameter::Temperature, influence)
    }

    /// Sequencer steps per beat, rounded into `1..=4`.
    #[must_use]
    pub fn subdivision(&self, influence: f64) -> u8 {
        let steps = self.blend(BlendParameter::Subdivision, influence).round();
        steps.clamp(1.0, 4.0) as u8
    }
}
