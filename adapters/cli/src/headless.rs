//! Windowless driver that performs a scripted gesture against the session.

use std::{fmt, sync::Arc, time::Duration};

use glam::Vec2;
use quantum_groove_core::{Command, ComplexityTier, Event, Tempo};
use quantum_groove_rendering::{FrameInput, FrameMailbox};
use quantum_groove_system_arrangement::MelodyModel;
use quantum_groove_world::{apply, query, Session, SessionConfig};
use tracing::info;

use crate::sound::{TracingSoundEngine, TriggerTally};

const ORBIT_CENTRE: Vec2 = Vec2::new(480.0, 360.0);
const ORBIT_RADIUS: Vec2 = Vec2::new(260.0, 200.0);
const KEY_CYCLE: u64 = 240;
const KEY_SEQUENCE: [char; 4] = ['q', 'w', 'e', 'r'];
const KEY_SPACING: u64 = 20;
const KEY_RELEASE_AT: u64 = 120;

/// Scripted performer: an orbiting pointer whose speed swells and fades plus a
/// recurring chord of held keys.
#[derive(Debug, Default)]
pub(crate) struct SyntheticPerformer {
    tick: u64,
    angle: f32,
}

impl SyntheticPerformer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Input captured for the next frame.
    pub(crate) fn next_input(&mut self) -> FrameInput {
        let tick = self.tick;
        self.tick += 1;

        let swell = 0.5 * (1.0 + (tick as f32 * 0.01).sin());
        self.angle += 0.02 + 0.18 * swell;
        let pointer = ORBIT_CENTRE + ORBIT_RADIUS * Vec2::new(self.angle.cos(), self.angle.sin());

        let mut input = FrameInput {
            pointer: Some(pointer),
            ..FrameInput::default()
        };
        let phase = tick % KEY_CYCLE;
        if phase % KEY_SPACING == 0 {
            if let Some(key) = usize::try_from(phase / KEY_SPACING)
                .ok()
                .and_then(|slot| KEY_SEQUENCE.get(slot))
            {
                input.keys_pressed.push(*key);
            }
        }
        if phase == KEY_RELEASE_AT {
            input.keys_released.extend(KEY_SEQUENCE);
        }
        input
    }
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HeadlessSummary {
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) tally: TriggerTally,
    pub(crate) melody_notes: u64,
    pub(crate) drum_notes: u64,
    pub(crate) tempo_changes: u64,
    pub(crate) tiers: Vec<ComplexityTier>,
    pub(crate) final_tempo: Option<Tempo>,
}

impl fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ticks, {:.2}s of session time",
            self.ticks,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(f, "triggers: {}", self.tally)?;
        writeln!(
            f,
            "notes: {} melody, {} drums",
            self.melody_notes, self.drum_notes
        )?;
        let tiers: Vec<&str> = self.tiers.iter().map(|tier| tier.label()).collect();
        writeln!(f, "complexity: {}", tiers.join(" -> "))?;
        match self.final_tempo {
            Some(tempo) => write!(
                f,
                "tempo: {} bpm after {} changes",
                tempo.bpm(),
                self.tempo_changes
            ),
            None => write!(f, "tempo: never published"),
        }
    }
}

/// Drives a fresh session for `ticks` frames of length `tick`.
pub(crate) fn run(
    config: SessionConfig,
    melody: Option<Arc<dyn MelodyModel>>,
    ticks: u64,
    tick: Duration,
) -> HeadlessSummary {
    let mut session = Session::new(config, TracingSoundEngine::new(), FrameMailbox::new(), melody);
    info!(banner = query::welcome_banner(&session), ticks, "headless run");

    let mut performer = SyntheticPerformer::new();
    let mut commands = Vec::new();
    let mut events = Vec::new();
    let mut tempo_changes = 0;
    let mut tiers = Vec::new();

    for _ in 0..ticks {
        commands.clear();
        performer.next_input().commands(tick, &mut commands);
        for command in commands.drain(..) {
            apply(&mut session, command, &mut events);
        }
        for event in events.drain(..) {
            match event {
                Event::TempoChanged { .. } => tempo_changes += 1,
                Event::ComplexityChanged { tier } => tiers.push(tier),
                _ => {}
            }
        }
    }

    let elapsed = query::elapsed(&session);
    apply(&mut session, Command::Stop, &mut events);
    events.clear();

    let (sound, _visuals) = session.into_parts();
    HeadlessSummary {
        ticks,
        elapsed,
        tally: sound.tally(),
        melody_notes: sound.melody_notes(),
        drum_notes: sound.drum_notes(),
        tempo_changes,
        tiers,
        final_tempo: sound.tempo(),
    }
}
