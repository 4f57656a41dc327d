use std::f64::consts::PI;

use quantum_groove_core::{Measurement, RhythmTrigger};
use quantum_groove_system_quantum_rhythm::{
    prepare_register, Element, QuantumRegister, QuantumRhythm, RegisterStage,
};

const SEED: u64 = 0x51ab_c0de_7e57_0001;

fn drive_grid() -> impl Iterator<Item = (f64, f64)> {
    (0..=10).flat_map(|a| (0..=10).map(move |b| (f64::from(a) / 10.0, f64::from(b) / 10.0)))
}

#[test]
fn probabilities_sum_to_one_for_every_drive() {
    for (drive_a, drive_b) in drive_grid() {
        let register = prepare_register(drive_a, drive_b);
        let total: f64 = register.probabilities().iter().sum();
        assert!(
            (total - 1.0).abs() < 1e-9,
            "prepared sum {total} for ({drive_a}, {drive_b})"
        );
        assert!(register.probabilities().iter().all(|p| *p >= 0.0));
    }

    let mut simulator = QuantumRhythm::new(SEED);
    for (drive_a, drive_b) in drive_grid() {
        let _ = simulator.process_input(drive_a, drive_b);
        let total: f64 = simulator.snapshot().probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "collapsed sum {total}");
    }
}

#[test]
fn resting_drives_always_produce_silence() {
    let register = prepare_register(0.0, 0.0);
    assert_eq!(register.amplitudes(), &[1.0, 0.0, 0.0, 0.0]);
    assert_eq!(register.probabilities(), &[1.0, 0.0, 0.0, 0.0]);

    let mut simulator = QuantumRhythm::new(SEED);
    for _ in 0..256 {
        let trigger = simulator.process_input(0.0, 0.0);
        assert_eq!(trigger, RhythmTrigger::SILENT);
        assert_eq!(
            simulator.snapshot().last_measurement,
            Some(Measurement::from_index(0))
        );
    }
}

#[test]
fn full_drive_superposes_both_elements_uniformly() {
    let mut register = QuantumRegister::ground();
    register.superpose(Element::Zero);
    register.superpose(Element::One);
    for probability in register.probabilities() {
        assert!((probability - 0.25).abs() < 1e-12, "{probability}");
    }

    let prepared = prepare_register(1.0, 0.0);
    for probability in prepared.probabilities() {
        assert!((probability - 0.25).abs() < 1e-12, "{probability}");
    }
}

#[test]
fn full_drive_reaches_every_outcome_evenly() {
    let mut simulator = QuantumRhythm::new(SEED);
    let mut counts = [0_u32; 4];
    for _ in 0..2_000 {
        let _ = simulator.process_input(1.0, 0.0);
        let measurement = simulator
            .snapshot()
            .last_measurement
            .expect("measurement recorded");
        counts[usize::from(measurement.state_value())] += 1;
    }
    for count in counts {
        assert!((400..=600).contains(&count), "counts {counts:?}");
    }
}

#[test]
fn single_superposition_is_entangled_by_conditional_flip() {
    let register = prepare_register(0.5, 0.0);
    let probabilities = register.probabilities();
    assert!((probabilities[0] - 0.5).abs() < 1e-12);
    assert!(probabilities[1].abs() < 1e-12);
    assert!(probabilities[2].abs() < 1e-12);
    assert!((probabilities[3] - 0.5).abs() < 1e-12);
    assert_eq!(register.stage(), RegisterStage::Entangled);

    let mut simulator = QuantumRhythm::new(SEED);
    let mut clap_count = 0;
    for _ in 0..2_000 {
        let trigger = simulator.process_input(0.5, 0.0);
        if trigger.clap {
            assert_eq!(
                trigger,
                RhythmTrigger {
                    kick: true,
                    snare: true,
                    hihat: false,
                    clap: true,
                }
            );
            clap_count += 1;
        } else {
            assert_eq!(trigger, RhythmTrigger::SILENT);
        }
    }
    assert!((800..=1_200).contains(&clap_count), "claps {clap_count}");
}

#[test]
fn quarter_turn_phase_suppresses_flagged_amplitudes() {
    let register = prepare_register(0.5, 0.5);
    assert!(register.probabilities()[0] > 1.0 - 1e-12);
    assert!(register.amplitudes()[3].abs() < 1e-12);
}

#[test]
fn gate_sequence_is_deterministic() {
    for (drive_a, drive_b) in drive_grid() {
        assert_eq!(
            prepare_register(drive_a, drive_b),
            prepare_register(drive_a, drive_b)
        );
    }

    let run = |seed: u64| {
        let mut simulator = QuantumRhythm::new(seed);
        drive_grid()
            .map(|(drive_a, drive_b)| {
                let trigger = simulator.process_input(drive_a, drive_b);
                (trigger, simulator.snapshot())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(SEED), run(SEED));
}

#[test]
fn snapshot_reflects_exact_post_collapse_state() {
    let mut simulator = QuantumRhythm::new(SEED);
    let trigger = simulator.process_with_draw(1.0, 0.25, 0.6);
    let snapshot = simulator.snapshot();

    let measurement = snapshot.last_measurement.expect("measurement recorded");
    let index = usize::from(measurement.state_value());
    let mut one_hot = [0.0; 4];
    one_hot[index] = 1.0;

    assert_eq!(snapshot.amplitudes, one_hot);
    assert_eq!(snapshot.probabilities, one_hot);
    assert_eq!(snapshot.phase, 0.25 * PI);
    assert_eq!(trigger, RhythmTrigger::from_measurement(measurement));
    assert_eq!(simulator.register().stage(), RegisterStage::Collapsed);
    assert_eq!(simulator.passes(), 1);
}

#[test]
fn explicit_draw_selects_by_running_sum() {
    let mut simulator = QuantumRhythm::new(SEED);
    let draws = [(0.0, 0_u8), (0.24, 0), (0.26, 1), (0.74, 2), (0.99, 3)];
    for (r, expected) in draws {
        let _ = simulator.process_with_draw(1.0, 0.0, r);
        let measurement = simulator.snapshot().last_measurement.expect("measured");
        assert_eq!(measurement.state_value(), expected, "draw {r}");
    }
}

#[test]
fn out_of_range_drives_are_clamped() {
    assert_eq!(prepare_register(f64::NAN, f64::NAN), prepare_register(0.0, 0.0));
    assert_eq!(prepare_register(7.0, -2.0), prepare_register(1.0, 0.0));

    let mut simulator = QuantumRhythm::new(SEED);
    let _ = simulator.process_input(f64::NAN, f64::INFINITY);
    let snapshot = simulator.snapshot();
    assert!(snapshot.amplitudes.iter().all(|value| value.is_finite()));
    assert_eq!(snapshot.phase, PI);
}

#[test]
fn reset_restarts_the_draw_sequence() {
    let mut simulator = QuantumRhythm::new(SEED);
    let first: Vec<_> = (0..32).map(|_| simulator.process_input(1.0, 0.1)).collect();
    simulator.reset(SEED);
    assert_eq!(simulator.passes(), 0);
    assert_eq!(simulator.snapshot().last_measurement, None);
    let second: Vec<_> = (0..32).map(|_| simulator.process_input(1.0, 0.1)).collect();
    assert_eq!(first, second);
}
