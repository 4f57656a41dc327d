//! Sound engine that narrates playback through `tracing` instead of audio output.

use std::fmt;

use quantum_groove_core::{
    ComplexityTier, RhythmTrigger, ScheduledNote, SoundEngine, SoundParameters, Tempo, Voice,
};
use tracing::{debug, info};

/// Running totals of drum hits produced by rhythm triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TriggerTally {
    /// Scheduler fires, including silent ones.
    pub(crate) fires: u64,
    /// Fires that sounded no drum at all.
    pub(crate) silent: u64,
    pub(crate) kick: u64,
    pub(crate) snare: u64,
    pub(crate) hihat: u64,
    pub(crate) clap: u64,
}

impl TriggerTally {
    fn record(&mut self, trigger: RhythmTrigger) {
        self.fires += 1;
        if !trigger.any() {
            self.silent += 1;
        }
        self.kick += u64::from(trigger.kick);
        self.snare += u64::from(trigger.snare);
        self.hihat += u64::from(trigger.hihat);
        self.clap += u64::from(trigger.clap);
    }
}

impl fmt::Display for TriggerTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fires ({} silent): kick {}, snare {}, hihat {}, clap {}",
            self.fires, self.silent, self.kick, self.snare, self.hihat, self.clap
        )
    }
}

/// [`SoundEngine`] that logs every call and keeps a tally for the summary.
#[derive(Debug, Default)]
pub(crate) struct TracingSoundEngine {
    tally: TriggerTally,
    melody_notes: u64,
    drum_notes: u64,
    tempo: Option<Tempo>,
}

impl TracingSoundEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn tally(&self) -> TriggerTally {
        self.tally
    }

    pub(crate) const fn melody_notes(&self) -> u64 {
        self.melody_notes
    }

    pub(crate) const fn drum_notes(&self) -> u64 {
        self.drum_notes
    }

    pub(crate) const fn tempo(&self) -> Option<Tempo> {
        self.tempo
    }
}

impl SoundEngine for TracingSoundEngine {
    fn play_rhythm_trigger(&mut self, trigger: RhythmTrigger) {
        self.tally.record(trigger);
        debug!(
            kick = trigger.kick,
            snare = trigger.snare,
            hihat = trigger.hihat,
            clap = trigger.clap,
            "rhythm trigger"
        );
    }

    fn play_note(&mut self, note: ScheduledNote) {
        match note.voice {
            Voice::Melody => self.melody_notes += 1,
            Voice::Drums => self.drum_notes += 1,
        }
        debug!(
            voice = ?note.voice,
            pitch = note.pitch,
            velocity = note.velocity,
            at_ms = note.at.as_millis() as u64,
            duration_ms = note.duration.as_millis() as u64,
            "note"
        );
    }

    fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = Some(tempo);
        debug!(bpm = tempo.bpm(), "tempo");
    }

    fn set_complexity(&mut self, tier: ComplexityTier) {
        info!(tier = tier.label(), "complexity");
    }

    fn apply_parameters(&mut self, _parameters: SoundParameters) {}
}
