use quantum_groove_core::{
    ComplexityTier, Note, RhythmTrigger, Voice, CLAP_PITCH, HIHAT_PITCH, KICK_PITCH, SNARE_PITCH,
};

/// Number of steps in every built-in phrase.
pub const PHRASE_STEPS: u16 = 16;

const KICK_VELOCITY: u8 = 110;
const SNARE_VELOCITY: u8 = 100;
const HIHAT_VELOCITY: u8 = 70;
const CLAP_VELOCITY: u8 = 90;

/// Looping sequence of notes laid out on a step grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phrase {
    steps: u16,
    notes: Vec<Note>,
}

impl Phrase {
    /// Creates a phrase, dropping notes that start outside the grid.
    ///
    /// A zero-length grid is widened to a single step.
    #[must_use]
    pub fn new(steps: u16, notes: Vec<Note>) -> Self {
        let steps = steps.max(1);
        let notes = notes
            .into_iter()
            .filter(|note| note.start_step < steps)
            .map(|note| Note {
                pitch: note.pitch.min(127),
                length_steps: note.length_steps.max(1),
                velocity: note.velocity.min(127),
                ..note
            })
            .collect();
        Self { steps, notes }
    }

    /// Length of the loop in steps.
    #[must_use]
    pub const fn steps(&self) -> u16 {
        self.steps
    }

    /// Every note in the phrase, drums first.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Melodic notes of the phrase.
    pub fn melody(&self) -> impl Iterator<Item = &Note> + '_ {
        self.notes
            .iter()
            .filter(|note| note.voice == Voice::Melody)
    }

    /// Percussion notes of the phrase.
    pub fn drums(&self) -> impl Iterator<Item = &Note> + '_ {
        self.notes.iter().filter(|note| note.voice == Voice::Drums)
    }

    /// Notes that start on the provided step of the loop.
    pub fn notes_at(&self, step: u16) -> impl Iterator<Item = &Note> + '_ {
        self.notes.iter().filter(move |note| note.start_step == step)
    }

    /// Keeps the drum lane and replaces the melody with `melody`.
    #[must_use]
    pub fn with_melody(&self, melody: &[Note]) -> Self {
        let notes = self
            .drums()
            .copied()
            .chain(melody.iter().map(|note| Note {
                voice: Voice::Melody,
                ..*note
            }))
            .collect();
        Self::new(self.steps, notes)
    }
}

/// Which drums play on each of the sixteen steps of a tier's pattern.
#[must_use]
pub fn drum_lanes(tier: ComplexityTier) -> [RhythmTrigger; PHRASE_STEPS as usize] {
    let mut lanes = [RhythmTrigger::SILENT; PHRASE_STEPS as usize];
    let (kicks, snares, hats, claps): (&[usize], &[usize], &[usize], &[usize]) = match tier {
        ComplexityTier::Simple => (&[0, 8], &[], &[4, 12], &[]),
        ComplexityTier::Medium => (&[0, 6, 8], &[4, 12], &[0, 2, 4, 6, 8, 10, 12, 14], &[]),
        ComplexityTier::Complex => (
            &[0, 3, 6, 8, 11],
            &[4, 12, 14],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
            &[12],
        ),
    };
    for step in kicks {
        lanes[*step].kick = true;
    }
    for step in snares {
        lanes[*step].snare = true;
    }
    for step in hats {
        lanes[*step].hihat = true;
    }
    for step in claps {
        lanes[*step].clap = true;
    }
    lanes
}

fn melody_table(tier: ComplexityTier) -> Vec<Note> {
    // (pitch, start step, length in steps, velocity)
    let table: &[(u8, u16, u16, u8)] = match tier {
        ComplexityTier::Simple => &[(60, 0, 4, 90), (64, 8, 4, 90)],
        ComplexityTier::Medium => &[
            (60, 0, 2, 96),
            (62, 2, 2, 88),
            (64, 4, 2, 96),
            (67, 6, 2, 88),
            (69, 8, 2, 96),
            (67, 10, 2, 88),
            (64, 12, 2, 96),
            (62, 14, 2, 88),
        ],
        ComplexityTier::Complex => &[
            (60, 0, 1, 104),
            (64, 1, 1, 92),
            (67, 2, 1, 96),
            (72, 4, 1, 104),
            (69, 5, 1, 92),
            (67, 6, 1, 96),
            (64, 8, 1, 104),
            (62, 9, 1, 92),
            (60, 10, 1, 96),
            (67, 12, 1, 104),
            (69, 13, 1, 92),
            (72, 14, 2, 100),
        ],
    };
    table
        .iter()
        .map(|(pitch, start, length, velocity)| Note::melody(*pitch, *start, *length, *velocity))
        .collect()
}

/// Deterministic pattern played for a complexity tier.
#[must_use]
pub fn pattern_for(tier: ComplexityTier) -> Phrase {
    let mut notes = Vec::new();
    for (step, trigger) in drum_lanes(tier).iter().enumerate() {
        let step = step as u16;
        if trigger.kick {
            notes.push(Note::drum(KICK_PITCH, step, KICK_VELOCITY));
        }
        if trigger.snare {
            notes.push(Note::drum(SNARE_PITCH, step, SNARE_VELOCITY));
        }
        if trigger.hihat {
            notes.push(Note::drum(HIHAT_PITCH, step, HIHAT_VELOCITY));
        }
        if trigger.clap {
            notes.push(Note::drum(CLAP_PITCH, step, CLAP_VELOCITY));
        }
    }
    notes.extend(melody_table(tier));
    Phrase::new(PHRASE_STEPS, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denser_tiers_never_drop_hits() {
        let count = |tier| drum_lanes(tier).iter().filter(|step| step.any()).count();
        assert!(count(ComplexityTier::Simple) < count(ComplexityTier::Medium));
        assert!(count(ComplexityTier::Medium) < count(ComplexityTier::Complex));
    }

    #[test]
    fn phrase_discards_notes_outside_grid() {
        let phrase = Phrase::new(
            4,
            vec![Note::melody(60, 3, 0, 200), Note::melody(62, 4, 1, 80)],
        );
        assert_eq!(phrase.notes(), &[Note::melody(60, 3, 1, 127)]);
    }
}
