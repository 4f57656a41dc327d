#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Quantum Groove engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and the pure systems. Adapters submit [`Command`]
//! values describing raw input and clock progress, the session executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing drive signals, rhythm triggers, and visual frames. Sound and
//! visual collaborators are reached exclusively through the [`SoundEngine`]
//! and [`VisualSurface`] traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Quantum Groove.";

/// Number of basis states tracked by the two-element quantum register.
pub const BASIS_STATES: usize = 4;

/// General MIDI drum-map pitch for the kick drum.
pub const KICK_PITCH: u8 = 36;
/// General MIDI drum-map pitch for the snare drum.
pub const SNARE_PITCH: u8 = 38;
/// General MIDI drum-map pitch for the hand clap.
pub const CLAP_PITCH: u8 = 39;
/// General MIDI drum-map pitch for the closed hi-hat.
pub const HIHAT_PITCH: u8 = 42;

/// Clamps an untrusted scalar into the unit interval, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Commands that express all permissible session inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Reports the latest pointer position in surface-local coordinates.
    PointerMoved {
        /// Horizontal coordinate in surface pixels.
        x: f64,
        /// Vertical coordinate in surface pixels.
        y: f64,
    },
    /// Reports that a single-character key went down.
    KeyPressed {
        /// Character produced by the key.
        key: char,
    },
    /// Reports that a single-character key was released.
    KeyReleased {
        /// Character produced by the key.
        key: char,
    },
    /// Advances the session clock by one logical frame.
    Tick {
        /// Duration of wall time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Halts the tick driver and discards all in-flight state.
    Stop,
    /// Resumes a stopped session from a fresh state.
    Start,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The signal tracker produced a new drive signal for this tick.
    DriveUpdated {
        /// Smoothed drive values after the tick.
        drive: DriveSignal,
    },
    /// The tempo derived from drive-A changed.
    TempoChanged {
        /// Tempo that became active.
        tempo: Tempo,
    },
    /// The pattern complexity tier derived from drive-B changed.
    ComplexityChanged {
        /// Tier that became active.
        tier: ComplexityTier,
    },
    /// Continuous sound parameters were re-blended for this tick.
    ParametersBlended {
        /// Blended parameters forwarded to the sound engine.
        parameters: SoundParameters,
    },
    /// The scheduler fired and the simulator collapsed to a new trigger.
    RhythmTriggered {
        /// Drum flags derived from the measurement.
        trigger: RhythmTrigger,
        /// Exact post-collapse register state.
        snapshot: QuantumSnapshot,
    },
    /// The arrangement sequencer scheduled a note.
    NoteScheduled {
        /// Note handed to the sound engine.
        note: ScheduledNote,
    },
    /// Frame state handed to the visual surface once per tick.
    VisualFrame {
        /// Frame content.
        frame: VisualFrame,
    },
    /// The session halted and discarded its state.
    Stopped,
    /// The session resumed from a fresh state.
    Started,
}

/// Pair of smoothed, bounded control scalars derived from raw input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveSignal {
    drive_a: f64,
    drive_b: f64,
}

impl DriveSignal {
    /// Signal with both drives at rest.
    pub const ZERO: Self = Self {
        drive_a: 0.0,
        drive_b: 0.0,
    };

    /// Creates a drive signal, clamping both components into `[0, 1]`.
    #[must_use]
    pub fn new(drive_a: f64, drive_b: f64) -> Self {
        Self {
            drive_a: clamp_unit(drive_a),
            drive_b: clamp_unit(drive_b),
        }
    }

    /// Movement-derived drive.
    #[must_use]
    pub const fn drive_a(&self) -> f64 {
        self.drive_a
    }

    /// Key-activity-derived drive.
    #[must_use]
    pub const fn drive_b(&self) -> f64 {
        self.drive_b
    }

    /// Largest absolute component-wise difference between two signals.
    #[must_use]
    pub fn max_change(&self, other: &DriveSignal) -> f64 {
        let a = (self.drive_a - other.drive_a).abs();
        let b = (self.drive_b - other.drive_b).abs();
        a.max(b)
    }
}

/// Two-bit measurement outcome extracted from a collapsed basis index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Measurement {
    q0: u8,
    q1: u8,
}

impl Measurement {
    /// Extracts the measurement bits from a basis index.
    ///
    /// The high bit becomes `q0` and the low bit becomes `q1`; indices above
    /// three only contribute their two lowest bits.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self {
            q0: ((index >> 1) & 1) as u8,
            q1: (index & 1) as u8,
        }
    }

    /// Value of the first measured bit.
    #[must_use]
    pub const fn q0(&self) -> u8 {
        self.q0
    }

    /// Value of the second measured bit.
    #[must_use]
    pub const fn q1(&self) -> u8 {
        self.q1
    }

    /// Both bits in `[q0, q1]` order.
    #[must_use]
    pub const fn bits(&self) -> [u8; 2] {
        [self.q0, self.q1]
    }

    /// Combined value `q0 * 2 + q1`.
    #[must_use]
    pub const fn state_value(&self) -> u8 {
        self.q0 * 2 + self.q1
    }
}

/// Drum flags produced by a single simulation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhythmTrigger {
    /// Kick drum fires for state values 1 and 3.
    pub kick: bool,
    /// Snare fires for state values 2 and 3.
    pub snare: bool,
    /// Hi-hat fires for state values 1 and 2.
    pub hihat: bool,
    /// Clap fires only for state value 3.
    pub clap: bool,
}

impl RhythmTrigger {
    /// Trigger with every drum silent.
    pub const SILENT: Self = Self {
        kick: false,
        snare: false,
        hihat: false,
        clap: false,
    };

    /// Maps a measurement onto the fixed drum lookup.
    #[must_use]
    pub const fn from_measurement(measurement: Measurement) -> Self {
        let value = measurement.state_value();
        Self {
            kick: value == 1 || value == 3,
            snare: value == 2 || value == 3,
            hihat: value == 1 || value == 2,
            clap: value == 3,
        }
    }

    /// Reports whether at least one drum fires.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.kick || self.snare || self.hihat || self.clap
    }

    /// General MIDI drum pitches for every drum that fires, in kick, snare, hi-hat, clap order.
    pub fn pitches(&self) -> impl Iterator<Item = u8> {
        [
            (self.kick, KICK_PITCH),
            (self.snare, SNARE_PITCH),
            (self.hihat, HIHAT_PITCH),
            (self.clap, CLAP_PITCH),
        ]
        .into_iter()
        .filter_map(|(fires, pitch)| fires.then_some(pitch))
    }
}

/// Read-only view of the quantum register handed to observers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantumSnapshot {
    /// Real-valued amplitudes indexed by basis label.
    pub amplitudes: [f64; BASIS_STATES],
    /// Normalised probabilities derived from the amplitudes.
    pub probabilities: [f64; BASIS_STATES],
    /// Outcome of the most recent collapse, if any pass has run.
    pub last_measurement: Option<Measurement>,
    /// Phase angle applied during the most recent pass, in radians.
    pub phase: f64,
}

impl QuantumSnapshot {
    /// Snapshot of the deterministic `[1, 0, 0, 0]` basis state.
    pub const GROUND: Self = Self {
        amplitudes: [1.0, 0.0, 0.0, 0.0],
        probabilities: [1.0, 0.0, 0.0, 0.0],
        last_measurement: None,
        phase: 0.0,
    };
}

impl Default for QuantumSnapshot {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Discrete pattern complexity tier selected from drive-B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexityTier {
    /// Sparse patterns for low key activity.
    #[default]
    Simple,
    /// Moderately busy patterns.
    Medium,
    /// Dense patterns for heavy key activity.
    Complex,
}

impl ComplexityTier {
    /// Every tier in ascending order.
    pub const ALL: [ComplexityTier; 3] = [Self::Simple, Self::Medium, Self::Complex];

    /// Lower-case label used in logs and the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

/// Transport tempo expressed in whole beats per minute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tempo(u16);

impl Tempo {
    /// Slowest tempo the drive mapping produces.
    pub const MIN: Tempo = Tempo(80);
    /// Fastest tempo the drive mapping produces.
    pub const MAX: Tempo = Tempo(160);

    /// Creates a tempo, clamping into the supported range.
    #[must_use]
    pub fn new(bpm: u16) -> Self {
        Self(bpm.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Retrieves the tempo in beats per minute.
    #[must_use]
    pub const fn bpm(&self) -> u16 {
        self.0
    }

    /// Duration of a single beat.
    #[must_use]
    pub fn beat(&self) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(self.0))
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::MIN
    }
}

/// Continuous parameters applied by the sound engine with a ramp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundParameters {
    /// Low-pass filter cutoff in hertz.
    pub filter_cutoff_hz: f64,
    /// Delay feedback amount in `[0, 1]`.
    pub feedback: f64,
    /// Reverb decay time in seconds.
    pub reverb_decay_secs: f64,
}

/// Instrument lane a note belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    /// Pitched melodic voice.
    Melody,
    /// Percussion lane; the pitch follows the General MIDI drum map.
    Drums,
}

/// Note expressed on the step grid of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// Lane the note is played on.
    pub voice: Voice,
    /// MIDI note number.
    pub pitch: u8,
    /// Step index at which the note starts within its phrase.
    pub start_step: u16,
    /// Length of the note measured in sequencer steps.
    pub length_steps: u16,
    /// MIDI velocity.
    pub velocity: u8,
}

impl Note {
    /// Creates a melodic note on the step grid.
    #[must_use]
    pub const fn melody(pitch: u8, start_step: u16, length_steps: u16, velocity: u8) -> Self {
        Self {
            voice: Voice::Melody,
            pitch,
            start_step,
            length_steps,
            velocity,
        }
    }

    /// Creates a single-step drum hit on the step grid.
    #[must_use]
    pub const fn drum(pitch: u8, start_step: u16, velocity: u8) -> Self {
        Self {
            voice: Voice::Drums,
            pitch,
            start_step,
            length_steps: 1,
            velocity,
        }
    }
}

/// Note resolved to wall-clock time and handed to the sound engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScheduledNote {
    /// Lane the note is played on.
    pub voice: Voice,
    /// MIDI note number.
    pub pitch: u8,
    /// MIDI velocity.
    pub velocity: u8,
    /// How long the note should sound.
    pub duration: Duration,
    /// Session time at which the note should start.
    pub at: Duration,
}

/// Per-tick state forwarded to the visual surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualFrame {
    /// Latest register snapshot, refreshed only when the scheduler fires.
    pub snapshot: QuantumSnapshot,
    /// Drive values for this tick.
    pub drive: DriveSignal,
    /// Whether a new rhythm trigger fired during this tick.
    pub triggered: bool,
    /// Most recent rhythm trigger.
    pub trigger: RhythmTrigger,
}

/// Synthesis collaborator that turns triggers, notes, and parameters into sound.
pub trait SoundEngine {
    /// Plays the drums flagged in the trigger immediately.
    fn play_rhythm_trigger(&mut self, trigger: RhythmTrigger);

    /// Schedules a single note.
    fn play_note(&mut self, note: ScheduledNote);

    /// Updates the transport tempo.
    fn set_tempo(&mut self, tempo: Tempo);

    /// Switches the active pattern complexity.
    fn set_complexity(&mut self, tier: ComplexityTier);

    /// Ramps continuous parameters toward the provided values.
    fn apply_parameters(&mut self, parameters: SoundParameters);
}

/// Rendering collaborator that owns its own render loop.
pub trait VisualSurface {
    /// Receives the state for the current tick.
    fn update(&mut self, frame: &VisualFrame);
}
