use quantum_groove_core::DriveSignal;
use quantum_groove_system_signal_tracker::{SignalTracker, TrackerConfig};

fn tracker() -> SignalTracker {
    SignalTracker::new(TrackerConfig::default())
}

#[test]
fn idle_tracker_stays_at_rest() {
    let mut tracker = tracker();
    for _ in 0..500 {
        let drive = tracker.update();
        assert_eq!(drive, DriveSignal::ZERO);
    }
}

#[test]
fn first_pointer_sample_does_not_count_as_motion() {
    let mut tracker = tracker();
    tracker.pointer_moved(500.0, 500.0);
    let drive = tracker.update();
    assert_eq!(drive.drive_a(), 0.0);
}

#[test]
fn fast_motion_saturates_drive_a() {
    let mut tracker = tracker();
    for step in 0..60 {
        let x = if step % 2 == 0 { 0.0 } else { 400.0 };
        tracker.pointer_moved(x, 0.0);
        let _ = tracker.update();
    }
    let drive = tracker.drive();
    assert!(drive.drive_a() > 0.99, "drive-a {}", drive.drive_a());
    assert!(drive.drive_a() <= 1.0);
    assert_eq!(drive.drive_b(), 0.0, "movement never feeds drive-b");
}

#[test]
fn drive_a_decays_monotonically_after_motion_stops() {
    let mut tracker = tracker();
    for step in 0..20 {
        tracker.pointer_moved(f64::from(step) * 25.0, 0.0);
        let _ = tracker.update();
    }

    let mut previous = tracker.drive().drive_a();
    assert!(previous > 0.0);
    for _ in 0..200 {
        let drive = tracker.update();
        assert!(drive.drive_a() <= previous, "drive-a increased while idle");
        assert!(drive.drive_a() >= 0.0);
        previous = drive.drive_a();
    }
    assert!(previous < 1e-9, "drive-a should approach zero: {previous}");
}

#[test]
fn key_burst_rises_then_decays_without_going_negative() {
    let mut tracker = tracker();
    for key in ['q', 'w', 'e'] {
        tracker.key_pressed(key);
        tracker.key_released(key);
    }
    assert_eq!(tracker.held_key_count(), 0);

    let samples: Vec<f64> = (0..400).map(|_| tracker.update().drive_b()).collect();
    assert!(samples.iter().all(|value| *value >= 0.0));

    let peak = samples
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (index, value)| {
            if *value > best.1 {
                (index, *value)
            } else {
                best
            }
        })
        .0;
    for window in samples[peak..].windows(2) {
        assert!(window[1] <= window[0], "drive-b rose after its peak");
    }
    assert!(samples[samples.len() - 1] < 1e-6);
}

#[test]
fn held_keys_converge_drive_b_to_complexity_share() {
    let mut tracker = tracker();
    for key in "abcdefg".chars() {
        tracker.key_pressed(key);
    }
    for _ in 0..400 {
        let _ = tracker.update();
    }
    let drive_b = tracker.drive().drive_b();
    assert!((drive_b - 0.5).abs() < 1e-3, "drive-b {drive_b}");
}

#[test]
fn key_activity_is_clamped_to_one() {
    let mut tracker = tracker();
    for _ in 0..20 {
        tracker.key_pressed('x');
    }
    assert_eq!(tracker.key_activity(), 1.0);
    assert_eq!(tracker.held_key_count(), 1);
}

#[test]
fn control_characters_are_ignored() {
    let mut tracker = tracker();
    tracker.key_pressed('\u{1b}');
    tracker.key_pressed('\t');
    assert_eq!(tracker.held_key_count(), 0);
    assert_eq!(tracker.key_activity(), 0.0);
}

#[test]
fn non_finite_pointer_samples_are_discarded() {
    let mut tracker = tracker();
    tracker.pointer_moved(10.0, 10.0);
    let _ = tracker.update();
    tracker.pointer_moved(f64::NAN, 10.0);
    tracker.pointer_moved(10.0, f64::INFINITY);
    let drive = tracker.update();
    assert_eq!(drive.drive_a(), 0.0);
    assert!(!drive.drive_a().is_nan());
    assert!(!drive.drive_b().is_nan());
}

#[test]
fn reset_returns_to_rest() {
    let mut tracker = tracker();
    tracker.key_pressed('k');
    tracker.pointer_moved(0.0, 0.0);
    let _ = tracker.update();
    tracker.pointer_moved(300.0, 0.0);
    let _ = tracker.update();
    tracker.reset();
    assert_eq!(tracker.drive(), DriveSignal::ZERO);
    assert_eq!(tracker.held_key_count(), 0);
    assert_eq!(tracker.update(), DriveSignal::ZERO);
}
