use std::time::Duration;

use quantum_groove_core::DriveSignal;
use quantum_groove_system_trigger_scheduler::{SchedulerConfig, TriggerScheduler};

fn scheduler() -> TriggerScheduler {
    TriggerScheduler::new(SchedulerConfig::default())
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn interval_endpoints_match_configuration() {
    let scheduler = scheduler();
    let config = SchedulerConfig::default();
    assert_eq!(scheduler.adjusted_interval(1.0), config.min_interval);
    assert_eq!(scheduler.adjusted_interval(0.0), config.base_interval);
    assert_eq!(scheduler.adjusted_interval(0.5), ms(360));
}

#[test]
fn interval_shrinks_monotonically_with_drive_a() {
    let scheduler = scheduler();
    let mut previous = scheduler.adjusted_interval(0.0);
    for step in 1..=100 {
        let interval = scheduler.adjusted_interval(f64::from(step) / 100.0);
        assert!(interval <= previous);
        assert!(interval >= SchedulerConfig::default().min_interval);
        previous = interval;
    }
}

#[test]
fn static_plateau_never_fires() {
    let mut scheduler = scheduler();
    assert!(!scheduler.should_fire(ms(0), DriveSignal::ZERO));
    assert!(!scheduler.should_fire(ms(10_000), DriveSignal::ZERO));

    let plateau = DriveSignal::new(0.5, 0.5);
    assert!(scheduler.should_fire(ms(20_000), plateau));
    for tick in 1..100 {
        assert!(
            !scheduler.should_fire(ms(20_000 + tick * 1_000), plateau),
            "plateau fired at tick {tick}"
        );
    }
}

#[test]
fn changing_input_fires_once_interval_elapses() {
    let mut scheduler = scheduler();
    assert!(scheduler.should_fire(ms(0), DriveSignal::new(0.0, 0.2)));
    assert_eq!(scheduler.last_trigger_at(), Some(ms(0)));

    assert!(!scheduler.should_fire(ms(300), DriveSignal::new(0.0, 0.4)));
    assert!(!scheduler.should_fire(ms(599), DriveSignal::new(0.0, 0.6)));
    assert!(scheduler.should_fire(ms(600), DriveSignal::new(0.0, 0.8)));
    assert_eq!(scheduler.last_trigger_at(), Some(ms(600)));
}

#[test]
fn fast_motion_shortens_the_wait() {
    let mut scheduler = scheduler();
    assert!(scheduler.should_fire(ms(0), DriveSignal::new(0.9, 0.0)));
    assert!(scheduler.should_fire(ms(120), DriveSignal::new(1.0, 0.0)));
    assert!(!scheduler.should_fire(ms(200), DriveSignal::new(0.5, 0.0)));
}

#[test]
fn slow_drift_accumulates_until_threshold_is_crossed() {
    let mut scheduler = scheduler();
    let mut fired = Vec::new();
    for tick in 1..=10_u32 {
        let drive = DriveSignal::new(0.0, f64::from(tick) * 0.004);
        fired.push(scheduler.should_fire(ms(u64::from(tick) * 1_000), drive));
    }
    assert_eq!(
        fired,
        vec![false, false, true, false, false, true, false, false, true, false]
    );
}

#[test]
fn reset_forgets_history() {
    let mut scheduler = scheduler();
    assert!(scheduler.should_fire(ms(0), DriveSignal::new(0.3, 0.3)));
    scheduler.reset();
    assert_eq!(scheduler.last_trigger_at(), None);
    assert!(scheduler.should_fire(ms(1), DriveSignal::new(0.3, 0.3)));
}
