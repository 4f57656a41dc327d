#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pattern tables, the step sequencer, and the generative-melody boundary.
//!
//! Each complexity tier owns a sixteen-step phrase made of a drum lane and a
//! melody. The [`Sequencer`] walks the active phrase at the current tempo and
//! subdivision and resolves the notes it crosses into [`ScheduledNote`]s. The
//! [`MelodyDirector`] decides which phrase is active, optionally replacing the
//! melody with the answer of a background [`MelodyModel`].

mod melody;
mod patterns;

use std::time::Duration;

use quantum_groove_core::{ScheduledNote, Tempo};

pub use melody::{
    MelodyDirector, MelodyError, MelodyModel, MelodyPoll, MelodyTask, ProceduralVariation,
};
pub use patterns::{drum_lanes, pattern_for, Phrase, PHRASE_STEPS};

/// Length of one sequencer step at the given tempo and subdivision.
#[must_use]
pub fn step_duration(tempo: Tempo, subdivision: u8) -> Duration {
    let steps_per_minute = f64::from(tempo.bpm()) * f64::from(subdivision.max(1));
    Duration::from_secs_f64(60.0 / steps_per_minute)
}

/// Step cursor that turns elapsed time into scheduled notes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequencer {
    position: f64,
}

impl Sequencer {
    /// Creates a sequencer positioned before the first step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute cursor position measured in steps.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// Advances the cursor by `dt` starting at session time `now`.
    ///
    /// Every step boundary in the half-open range covered by this advance
    /// schedules the notes that start on it. A step on the lower edge is
    /// emitted here and never again on the next advance.
    pub fn advance(
        &mut self,
        now: Duration,
        dt: Duration,
        tempo: Tempo,
        subdivision: u8,
        phrase: &Phrase,
        out: &mut Vec<ScheduledNote>,
    ) {
        let step = step_duration(tempo, subdivision).as_secs_f64();
        let start = self.position;
        let end = start + dt.as_secs_f64() / step;
        self.position = end;

        let loop_steps = u64::from(phrase.steps());
        let mut boundary = start.ceil();
        while boundary < end {
            let offset = Duration::from_secs_f64((boundary - start) * step);
            let grid_step = (boundary as u64 % loop_steps) as u16;
            for note in phrase.notes_at(grid_step) {
                out.push(ScheduledNote {
                    voice: note.voice,
                    pitch: note.pitch,
                    velocity: note.velocity,
                    duration: Duration::from_secs_f64(f64::from(note.length_steps) * step),
                    at: now + offset,
                });
            }
            boundary += 1.0;
        }
    }

    /// Rewinds the cursor to the first step.
    pub fn reset(&mut self) {
        self.position = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_length_follows_tempo_and_subdivision() {
        assert_eq!(step_duration(Tempo::new(120), 1).as_millis(), 500);
        assert_eq!(step_duration(Tempo::new(120), 2).as_millis(), 250);
        assert_eq!(step_duration(Tempo::new(120), 0).as_millis(), 500);
    }

    #[test]
    fn zero_dt_schedules_nothing() {
        let mut sequencer = Sequencer::new();
        let mut out = Vec::new();
        let phrase = pattern_for(quantum_groove_core::ComplexityTier::Simple);
        sequencer.advance(
            Duration::ZERO,
            Duration::ZERO,
            Tempo::MIN,
            1,
            &phrase,
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(sequencer.position(), 0.0);
    }
}
