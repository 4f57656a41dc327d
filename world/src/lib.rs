#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Quantum Groove.
//!
//! A [`Session`] owns the four core systems plus the arrangement layer and
//! the two collaborators handed to it at construction. Adapters drive it
//! exclusively through [`apply`]; everything the session decides is both
//! pushed as an [`Event`] and forwarded to the collaborators, in the same
//! order.

mod clock;
pub mod config;

use std::{sync::Arc, time::Duration};

use quantum_groove_core::{
    Command, ComplexityTier, DriveSignal, Event, QuantumSnapshot, RhythmTrigger, ScheduledNote,
    SoundEngine, Tempo, VisualFrame, VisualSurface, WELCOME_BANNER,
};
use quantum_groove_system_arrangement::{MelodyDirector, MelodyModel, Sequencer};
use quantum_groove_system_parameter_blend::{complexity_tier, tempo_for, ParameterBlender};
use quantum_groove_system_quantum_rhythm::QuantumRhythm;
use quantum_groove_system_signal_tracker::SignalTracker;
use quantum_groove_system_trigger_scheduler::TriggerScheduler;
use tracing::{debug, info, trace};

use crate::clock::SessionClock;
pub use crate::config::{ConfigError, SessionConfig};

/// Live session wiring input, simulation, arrangement, and collaborators together.
pub struct Session<S, V> {
    banner: &'static str,
    config: SessionConfig,
    sound: S,
    visuals: V,
    clock: SessionClock,
    running: bool,
    tracker: SignalTracker,
    rhythm: QuantumRhythm,
    blender: ParameterBlender,
    scheduler: TriggerScheduler,
    director: MelodyDirector,
    sequencer: Sequencer,
    published_tempo: Option<Tempo>,
    published_tier: Option<ComplexityTier>,
    drive: DriveSignal,
    snapshot: QuantumSnapshot,
    trigger: RhythmTrigger,
    scratch_notes: Vec<ScheduledNote>,
}

impl<S, V> Session<S, V>
where
    S: SoundEngine,
    V: VisualSurface,
{
    /// Creates a running session at rest.
    ///
    /// Without a melody model the arrangement plays the built-in pattern tables.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        sound: S,
        visuals: V,
        melody: Option<Arc<dyn MelodyModel>>,
    ) -> Self {
        info!(
            seed = config.rng_seed,
            generative_melody = melody.is_some(),
            "session created"
        );
        Self {
            banner: WELCOME_BANNER,
            clock: SessionClock::new(config.max_tick()),
            running: true,
            tracker: SignalTracker::new(config.tracker.tracker_config()),
            rhythm: QuantumRhythm::new(config.rng_seed),
            blender: ParameterBlender::new(config.presets),
            scheduler: TriggerScheduler::new(config.scheduler.scheduler_config()),
            director: MelodyDirector::new(melody),
            sequencer: Sequencer::new(),
            published_tempo: None,
            published_tier: None,
            drive: DriveSignal::ZERO,
            snapshot: QuantumSnapshot::GROUND,
            trigger: RhythmTrigger::SILENT,
            scratch_notes: Vec::new(),
            config,
            sound,
            visuals,
        }
    }

    /// Sound collaborator.
    #[must_use]
    pub fn sound(&self) -> &S {
        &self.sound
    }

    /// Visual collaborator.
    #[must_use]
    pub fn visuals(&self) -> &V {
        &self.visuals
    }

    /// Mutable access to the visual collaborator.
    pub fn visuals_mut(&mut self) -> &mut V {
        &mut self.visuals
    }

    /// Consumes the session, handing back both collaborators.
    pub fn into_parts(self) -> (S, V) {
        (self.sound, self.visuals)
    }

    fn discard_state(&mut self) {
        self.director.reset();
        self.tracker.reset();
        self.rhythm.reset(self.config.rng_seed);
        self.scheduler.reset();
        self.sequencer.reset();
        self.clock.reset();
        self.published_tempo = None;
        self.published_tier = None;
        self.drive = DriveSignal::ZERO;
        self.snapshot = QuantumSnapshot::GROUND;
        self.trigger = RhythmTrigger::SILENT;
        self.scratch_notes.clear();
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let (tick_start, step) = self.clock.advance(dt);
        if step < dt {
            debug!(requested = ?dt, applied = ?step, "clamped oversized tick");
        }
        let now = self.clock.elapsed();

        let drive = self.tracker.update();
        self.drive = drive;
        out_events.push(Event::DriveUpdated { drive });

        let tempo = tempo_for(drive.drive_a());
        if self.published_tempo != Some(tempo) {
            self.published_tempo = Some(tempo);
            self.sound.set_tempo(tempo);
            out_events.push(Event::TempoChanged { tempo });
        }

        let tier = complexity_tier(drive.drive_b());
        if self.published_tier != Some(tier) {
            self.published_tier = Some(tier);
            self.sound.set_complexity(tier);
            out_events.push(Event::ComplexityChanged { tier });
            debug!(tier = tier.label(), "complexity changed");
            self.director
                .select_tier(tier, self.blender.temperature(drive.drive_b()));
        }

        let parameters = self.blender.sound_parameters(drive.drive_b());
        self.sound.apply_parameters(parameters);
        out_events.push(Event::ParametersBlended { parameters });

        let triggered = self.scheduler.should_fire(now, drive);
        if triggered {
            let trigger = self.rhythm.process_input(drive.drive_a(), drive.drive_b());
            let snapshot = self.rhythm.snapshot();
            self.trigger = trigger;
            self.snapshot = snapshot;
            self.sound.play_rhythm_trigger(trigger);
            out_events.push(Event::RhythmTriggered { trigger, snapshot });
        }

        let _ = self.director.poll();
        let subdivision = self.blender.subdivision(drive.drive_b());
        self.scratch_notes.clear();
        self.sequencer.advance(
            tick_start,
            step,
            tempo,
            subdivision,
            self.director.active_phrase(),
            &mut self.scratch_notes,
        );
        for note in self.scratch_notes.drain(..) {
            self.sound.play_note(note);
            out_events.push(Event::NoteScheduled { note });
        }

        let frame = VisualFrame {
            snapshot: self.snapshot,
            drive,
            triggered,
            trigger: self.trigger,
        };
        self.visuals.update(&frame);
        out_events.push(Event::VisualFrame { frame });
    }
}

impl<S, V> std::fmt::Debug for Session<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("running", &self.running)
            .field("elapsed", &self.clock.elapsed())
            .field("drive", &self.drive)
            .field("tempo", &self.published_tempo)
            .field("tier", &self.published_tier)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply<S, V>(session: &mut Session<S, V>, command: Command, out_events: &mut Vec<Event>)
where
    S: SoundEngine,
    V: VisualSurface,
{
    if !session.running {
        if command == Command::Start {
            session.running = true;
            info!("session started");
            out_events.push(Event::Started);
        } else {
            trace!(?command, "ignoring command while stopped");
        }
        return;
    }

    match command {
        Command::PointerMoved { x, y } => session.tracker.pointer_moved(x, y),
        Command::KeyPressed { key } => session.tracker.key_pressed(key),
        Command::KeyReleased { key } => session.tracker.key_released(key),
        Command::Tick { dt } => session.tick(dt, out_events),
        Command::Stop => {
            session.running = false;
            session.discard_state();
            info!("session stopped");
            out_events.push(Event::Stopped);
        }
        Command::Start => {}
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use quantum_groove_core::{
        ComplexityTier, DriveSignal, QuantumSnapshot, RhythmTrigger, Tempo,
    };
    use quantum_groove_system_arrangement::Phrase;

    use super::{Session, SessionConfig};

    /// Retrieves the welcome banner that adapters may display.
    #[must_use]
    pub fn welcome_banner<S, V>(session: &Session<S, V>) -> &'static str {
        session.banner
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config<S, V>(session: &Session<S, V>) -> &SessionConfig {
        &session.config
    }

    /// Reports whether ticks are currently processed.
    #[must_use]
    pub fn is_running<S, V>(session: &Session<S, V>) -> bool {
        session.running
    }

    /// Session time covered by processed ticks.
    #[must_use]
    pub fn elapsed<S, V>(session: &Session<S, V>) -> Duration {
        session.clock.elapsed()
    }

    /// Number of ticks processed since start.
    #[must_use]
    pub fn tick_index<S, V>(session: &Session<S, V>) -> u64 {
        session.clock.tick_index()
    }

    /// Drive signal produced by the most recent tick.
    #[must_use]
    pub fn drive<S, V>(session: &Session<S, V>) -> DriveSignal {
        session.drive
    }

    /// Current decaying key-activity level of the tracker.
    #[must_use]
    pub fn key_activity<S, V>(session: &Session<S, V>) -> f64 {
        session.tracker.key_activity()
    }

    /// Tempo most recently published to the sound engine.
    #[must_use]
    pub fn tempo<S, V>(session: &Session<S, V>) -> Option<Tempo> {
        session.published_tempo
    }

    /// Complexity tier most recently published to the sound engine.
    #[must_use]
    pub fn complexity<S, V>(session: &Session<S, V>) -> Option<ComplexityTier> {
        session.published_tier
    }

    /// Register snapshot of the most recent scheduler fire.
    #[must_use]
    pub fn snapshot<S, V>(session: &Session<S, V>) -> QuantumSnapshot {
        session.snapshot
    }

    /// Trigger of the most recent scheduler fire.
    #[must_use]
    pub fn last_trigger<S, V>(session: &Session<S, V>) -> RhythmTrigger {
        session.trigger
    }

    /// Number of simulator passes since start.
    #[must_use]
    pub fn simulator_passes<S, V>(session: &Session<S, V>) -> u64 {
        session.rhythm.passes()
    }

    /// Phrase the sequencer is currently playing.
    #[must_use]
    pub fn active_phrase<S, V>(session: &Session<S, V>) -> &Phrase {
        session.director.active_phrase()
    }

    /// Reports whether a generated melody is awaited.
    #[must_use]
    pub fn melody_pending<S, V>(session: &Session<S, V>) -> bool {
        session.director.is_pending()
    }

    /// Reports whether the active phrase carries a generated melody.
    #[must_use]
    pub fn melody_generated<S, V>(session: &Session<S, V>) -> bool {
        session.director.is_generated()
    }
}
