use std::{cell::RefCell, rc::Rc, sync::Arc, thread, time::Duration};

use quantum_groove_core::{
    Command, ComplexityTier, DriveSignal, Event, QuantumSnapshot, RhythmTrigger, ScheduledNote,
    SoundEngine, SoundParameters, Tempo, VisualFrame, VisualSurface,
};
use quantum_groove_system_arrangement::{pattern_for, MelodyModel, ProceduralVariation};
use quantum_groove_world::{apply, query, Session, SessionConfig};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Tempo(Tempo),
    Complexity(ComplexityTier),
    Parameters(SoundParameters),
    Trigger(RhythmTrigger),
    Note(ScheduledNote),
    Frame(VisualFrame),
}

#[derive(Clone, Debug, Default)]
struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Recorder {
    fn take(&self) -> Vec<Call> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl SoundEngine for Recorder {
    fn play_rhythm_trigger(&mut self, trigger: RhythmTrigger) {
        self.calls.borrow_mut().push(Call::Trigger(trigger));
    }

    fn play_note(&mut self, note: ScheduledNote) {
        self.calls.borrow_mut().push(Call::Note(note));
    }

    fn set_tempo(&mut self, tempo: Tempo) {
        self.calls.borrow_mut().push(Call::Tempo(tempo));
    }

    fn set_complexity(&mut self, tier: ComplexityTier) {
        self.calls.borrow_mut().push(Call::Complexity(tier));
    }

    fn apply_parameters(&mut self, parameters: SoundParameters) {
        self.calls.borrow_mut().push(Call::Parameters(parameters));
    }
}

impl VisualSurface for Recorder {
    fn update(&mut self, frame: &VisualFrame) {
        self.calls.borrow_mut().push(Call::Frame(*frame));
    }
}

fn session_with_recorder(config: SessionConfig) -> (Session<Recorder, Recorder>, Recorder) {
    let recorder = Recorder::default();
    let session = Session::new(config, recorder.clone(), recorder.clone(), None);
    (session, recorder)
}

fn scripted_commands(tick: u32) -> Vec<Command> {
    let t = f64::from(tick);
    let speed = 0.05 + 0.12 * (1.0 + (t * 0.05).sin());
    let angle = t * speed;
    let mut commands = vec![Command::PointerMoved {
        x: 400.0 + 220.0 * angle.cos(),
        y: 300.0 + 180.0 * angle.sin(),
    }];
    if tick % 45 == 0 {
        commands.push(Command::KeyPressed { key: 'a' });
    }
    if tick % 45 == 20 {
        commands.push(Command::KeyReleased { key: 'a' });
    }
    commands.push(Command::Tick { dt: FRAME });
    commands
}

fn run_script(session: &mut Session<Recorder, Recorder>, ticks: u32) -> Vec<Event> {
    let mut events = Vec::new();
    for tick in 0..ticks {
        for command in scripted_commands(tick) {
            apply(session, command, &mut events);
        }
    }
    events
}

fn expected_call(event: &Event) -> Option<Call> {
    match event {
        Event::TempoChanged { tempo } => Some(Call::Tempo(*tempo)),
        Event::ComplexityChanged { tier } => Some(Call::Complexity(*tier)),
        Event::ParametersBlended { parameters } => Some(Call::Parameters(*parameters)),
        Event::RhythmTriggered { trigger, .. } => Some(Call::Trigger(*trigger)),
        Event::NoteScheduled { note } => Some(Call::Note(*note)),
        Event::VisualFrame { frame } => Some(Call::Frame(*frame)),
        Event::DriveUpdated { .. } | Event::Stopped | Event::Started => None,
    }
}

#[test]
fn collaborators_are_called_in_event_order() {
    let (mut session, recorder) = session_with_recorder(SessionConfig::default());
    let events = run_script(&mut session, 400);
    let expected: Vec<Call> = events.iter().filter_map(expected_call).collect();
    assert_eq!(recorder.take(), expected);
}

#[test]
fn every_tick_emits_events_in_fixed_order() {
    let (mut session, _recorder) = session_with_recorder(SessionConfig::default());
    let events = run_script(&mut session, 300);

    let rank = |event: &Event| match event {
        Event::DriveUpdated { .. } => 0,
        Event::TempoChanged { .. } => 1,
        Event::ComplexityChanged { .. } => 2,
        Event::ParametersBlended { .. } => 3,
        Event::RhythmTriggered { .. } => 4,
        Event::NoteScheduled { .. } => 5,
        Event::VisualFrame { .. } => 6,
        Event::Stopped | Event::Started => 7,
    };

    let mut frames = 0;
    let mut previous = 0;
    let mut triggered_this_tick = false;
    for event in &events {
        let current = rank(event);
        if current == 0 {
            previous = 0;
            triggered_this_tick = false;
            continue;
        }
        assert!(current >= previous, "{event:?} out of order");
        previous = current;
        if let Event::RhythmTriggered { .. } = event {
            triggered_this_tick = true;
        }
        if let Event::VisualFrame { frame } = event {
            assert_eq!(frame.triggered, triggered_this_tick);
            frames += 1;
        }
    }
    assert_eq!(frames, 300);
}

#[test]
fn idle_session_never_triggers() {
    let (mut session, _recorder) = session_with_recorder(SessionConfig::default());
    let mut events = Vec::new();
    apply(&mut session, Command::PointerMoved { x: 10.0, y: 10.0 }, &mut events);
    for _ in 0..600 {
        apply(&mut session, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::RhythmTriggered { .. })));
    assert_eq!(query::snapshot(&session), QuantumSnapshot::GROUND);
    assert_eq!(query::drive(&session), DriveSignal::ZERO);
}

#[test]
fn movement_produces_normalised_triggers() {
    let (mut session, _recorder) = session_with_recorder(SessionConfig::default());
    let events = run_script(&mut session, 600);

    let snapshots: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::RhythmTriggered { trigger, snapshot } => Some((*trigger, *snapshot)),
            _ => None,
        })
        .collect();
    assert!(!snapshots.is_empty(), "scripted motion should fire the scheduler");
    for (trigger, snapshot) in &snapshots {
        let total: f64 = snapshot.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        let measurement = snapshot.last_measurement.expect("measurement");
        assert_eq!(*trigger, RhythmTrigger::from_measurement(measurement));
    }
    assert_eq!(query::simulator_passes(&session), snapshots.len() as u64);
}

#[test]
fn tempo_and_tier_are_published_only_on_change() {
    let (mut session, _recorder) = session_with_recorder(SessionConfig::default());
    let events = run_script(&mut session, 600);

    let tempos: Vec<Tempo> = events
        .iter()
        .filter_map(|event| match event {
            Event::TempoChanged { tempo } => Some(*tempo),
            _ => None,
        })
        .collect();
    assert!(tempos.len() > 1);
    assert!(tempos.windows(2).all(|pair| pair[0] != pair[1]));
    assert!(tempos
        .iter()
        .all(|tempo| (Tempo::MIN..=Tempo::MAX).contains(tempo)));

    let tiers: Vec<ComplexityTier> = events
        .iter()
        .filter_map(|event| match event {
            Event::ComplexityChanged { tier } => Some(*tier),
            _ => None,
        })
        .collect();
    assert_eq!(tiers.first(), Some(&ComplexityTier::Simple));
    assert!(tiers.windows(2).all(|pair| pair[0] != pair[1]));
}

#[test]
fn identical_seeds_replay_identically() {
    let (mut first, _) = session_with_recorder(SessionConfig::default());
    let (mut second, _) = session_with_recorder(SessionConfig::default());
    assert_eq!(run_script(&mut first, 500), run_script(&mut second, 500));
}

#[test]
fn oversized_ticks_are_clamped() {
    let (mut session, _recorder) = session_with_recorder(SessionConfig::default());
    let mut events = Vec::new();
    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_secs(5),
        },
        &mut events,
    );
    assert_eq!(query::elapsed(&session), Duration::from_millis(250));
    assert_eq!(query::tick_index(&session), 1);
}

#[test]
fn stop_discards_state_and_start_replays_from_scratch() {
    let (mut session, recorder) = session_with_recorder(SessionConfig::default());
    let original = run_script(&mut session, 200);

    let mut events = Vec::new();
    apply(&mut session, Command::Stop, &mut events);
    apply(&mut session, Command::Start, &mut events);
    assert_eq!(events, vec![Event::Stopped, Event::Started]);
    assert_eq!(query::drive(&session), DriveSignal::ZERO);
    assert_eq!(query::snapshot(&session), QuantumSnapshot::GROUND);
    assert_eq!(query::tempo(&session), None);
    assert_eq!(query::elapsed(&session), Duration::ZERO);
    let _ = recorder.take();

    assert_eq!(run_script(&mut session, 200), original);
}

#[test]
fn key_activity_raises_complexity_and_requests_melody() {
    let recorder = Recorder::default();
    let model: Arc<dyn MelodyModel> = Arc::new(ProceduralVariation::new(99));
    let mut session = Session::new(
        SessionConfig::default(),
        recorder.clone(),
        recorder,
        Some(model),
    );
    let mut events = Vec::new();
    for key in ['q', 'w', 'e', 'r', 't'] {
        apply(&mut session, Command::KeyPressed { key }, &mut events);
    }
    for _ in 0..60 {
        apply(&mut session, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(events
        .iter()
        .any(|event| *event == Event::ComplexityChanged {
            tier: ComplexityTier::Medium
        }));

    for _ in 0..400 {
        if !query::melody_pending(&session) {
            break;
        }
        thread::sleep(Duration::from_millis(5));
        apply(&mut session, Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(!query::melody_pending(&session));
    assert!(query::melody_generated(&session));
    let tier = query::complexity(&session).expect("tier published");
    let expected: Vec<_> = pattern_for(tier).drums().copied().collect();
    let drums: Vec<_> = query::active_phrase(&session).drums().copied().collect();
    assert_eq!(drums, expected);
}

#[test]
fn session_config_round_trips_through_the_world() {
    let config = SessionConfig::from_toml_str("rng_seed = 5\nmax_tick_ms = 100\n").expect("config");
    let (mut session, _recorder) = session_with_recorder(config.clone());
    assert_eq!(query::config(&session), &config);
    let mut events = Vec::new();
    apply(
        &mut session,
        Command::Tick {
            dt: Duration::from_millis(400),
        },
        &mut events,
    );
    assert_eq!(query::elapsed(&session), Duration::from_millis(100));
}
