//! Integration tests for the MonitorService loop: sampling policy, publish
//! gating, the sequence counter and timer cadence, driven through mock ports.

use crate::mock_hw::{MockDb, MockSensors, MockWifi, RecordingSink};

use aquasense::app::events::AppEvent;
use aquasense::app::service::MonitorService;
use aquasense::config::SystemConfig;
use aquasense::error::SensorError;
use aquasense::rtdb::{DbError, TokenStatus};

fn service() -> (MonitorService, RecordingSink) {
    let mut svc = MonitorService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    (svc, sink)
}

// ── Sampling ──────────────────────────────────────────────────

#[test]
fn adc_530_publishes_value_53() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(530, 0, 20.0);
    let mut db = MockDb::ready();

    svc.sample(&mut sensors, &mut sink);
    svc.publish(0, &mut db, &mut sink);

    assert_eq!(db.value_at("/test/string"), Some("value_53"));
}

#[test]
fn thirty_six_pulses_publish_as_two_litres() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(0, 36, 20.0);
    let mut db = MockDb::ready();

    svc.sample(&mut sensors, &mut sink);
    svc.publish(0, &mut db, &mut sink);

    assert_eq!(db.value_at("/test/flowread"), Some("2.00"));
}

#[test]
fn zero_pulse_window_keeps_last_flow() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::new()
        .queue(100, 18, Ok(20.0))
        .queue(100, 0, Ok(20.0))
        .queue(100, 0, Ok(20.0));

    for _ in 0..3 {
        svc.sample(&mut sensors, &mut sink);
    }
    assert!((svc.readings().flow_lpm - 1.0).abs() < 1e-6);
}

#[test]
fn out_of_band_temperature_leaves_reading_unchanged() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::new()
        .queue(0, 0, Ok(21.0))
        .queue(0, 0, Ok(-127.0))
        .queue(0, 0, Ok(125.0))
        .queue(0, 0, Ok(85.5))
        .queue(0, 0, Ok(-50.0));

    svc.sample(&mut sensors, &mut sink);
    let before = *svc.readings();
    svc.sample(&mut sensors, &mut sink);
    svc.sample(&mut sensors, &mut sink);
    assert_eq!(svc.readings().temperature_c, before.temperature_c);

    svc.sample(&mut sensors, &mut sink);
    assert_eq!(svc.readings().temperature_c, 85.5);

    svc.sample(&mut sensors, &mut sink);
    assert_eq!(svc.readings().temperature_c, 85.5);
}

#[test]
fn failed_level_read_keeps_last_valid_level() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::new()
        .queue(530, 0, Ok(20.0))
        .queue_water(Err(SensorError::AdcReadFailed(0x103)), 0, Ok(20.0));
    let mut db = MockDb::ready();

    svc.sample(&mut sensors, &mut sink);
    svc.sample(&mut sensors, &mut sink);
    assert_eq!(svc.readings().water_level, 53);

    svc.publish(0, &mut db, &mut sink);
    assert_eq!(db.value_at("/test/string"), Some("value_53"));
}

#[test]
fn probe_failures_never_surface_as_events() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::new()
        .queue(0, 0, Err(SensorError::NoDevice))
        .queue(0, 0, Err(SensorError::CrcMismatch));

    svc.sample(&mut sensors, &mut sink);
    svc.sample(&mut sensors, &mut sink);

    assert_eq!(svc.readings().temperature_c, 0.0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Sampled(_))), 2);
}

// ── Publishing ────────────────────────────────────────────────

#[test]
fn not_ready_means_zero_writes_and_untouched_state() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(530, 36, 22.0);
    svc.sample(&mut sensors, &mut sink);
    let before = *svc.readings();

    let mut db = MockDb::not_ready();
    assert!(svc.publish(10_000, &mut db, &mut sink).is_none());

    assert!(db.writes.is_empty());
    assert_eq!(*svc.readings(), before);
    assert_eq!(svc.next_sequence(), 0);
    assert_eq!(sink.events.last(), Some(&AppEvent::PublishSkipped));
}

#[test]
fn sequence_advances_once_per_ready_publish() {
    let (mut svc, mut sink) = service();
    let mut db = MockDb::ready();

    for _ in 0..3 {
        svc.publish(0, &mut db, &mut sink);
    }
    db.ready = false;
    svc.publish(0, &mut db, &mut sink);
    db.ready = true;
    svc.publish(0, &mut db, &mut sink);

    assert_eq!(db.history("/test/int"), vec!["0", "1", "2", "3"]);
    assert_eq!(svc.next_sequence(), 4);
}

#[test]
fn failed_write_does_not_block_the_others() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(640, 9, 19.6);
    svc.sample(&mut sensors, &mut sink);

    let mut db = MockDb::ready();
    db.failing.insert("/test/int".into(), DbError::Status(500));

    let report = svc.publish(0, &mut db, &mut sink).expect("ready cycle reports");
    assert_eq!(db.writes.len(), 4);
    assert!(!report.all_ok());
    let failed: Vec<_> = report.failures().map(|w| w.path.as_str()).collect();
    assert_eq!(failed, vec!["/test/int"]);

    assert_eq!(db.value_at("/test/string"), Some("value_64"));
    assert_eq!(db.value_at("/test/temp"), Some("20"));
    assert_eq!(db.value_at("/test/flowread"), Some("0.50"));

    // The failed cycle still consumed its sequence number.
    svc.publish(0, &mut db, &mut sink);
    assert_eq!(db.history("/test/int"), vec!["0", "1"]);
}

#[test]
fn payload_goes_under_configured_root() {
    let mut config = SystemConfig::default();
    config.db_root = heapless::String::try_from("/tanks/north").expect("fits");
    let mut svc = MonitorService::new(config);
    let mut sink = RecordingSink::new();
    let mut db = MockDb::ready();

    svc.publish(0, &mut db, &mut sink);

    let paths: Vec<_> = db.writes.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/tanks/north/string", "/tanks/north/int", "/tanks/north/temp", "/tanks/north/flowread"]
    );
}

#[test]
fn token_status_changes_are_forwarded_in_order() {
    let (mut svc, mut sink) = service();
    let mut db = MockDb::ready();
    db.status_changes.extend([TokenStatus::Signing, TokenStatus::Requesting, TokenStatus::Ready]);

    svc.publish(0, &mut db, &mut sink);

    assert_eq!(
        sink.token_statuses(),
        vec![TokenStatus::Signing, TokenStatus::Requesting, TokenStatus::Ready]
    );
    // Status events precede the publish result.
    assert!(matches!(sink.events.last(), Some(AppEvent::Published(_))));
}

// ── Loop cadence ──────────────────────────────────────────────

#[test]
fn twenty_seconds_of_loop_gives_twenty_samples_and_two_publishes() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(500, 0, 20.0);
    let mut wifi = MockWifi::up();
    let mut db = MockDb::ready();

    let mut now = 0;
    while now <= 20_000 {
        svc.poll(now, &mut sensors, &mut wifi, &mut db, &mut sink);
        now += 10;
    }

    assert_eq!(sensors.reads, 20);
    assert_eq!(db.ready_calls, 2);
    assert_eq!(db.history("/test/int"), vec!["0", "1"]);
    assert_eq!(wifi.connect_calls, 0);
}

#[test]
fn dropped_link_is_retried_every_pass_until_it_comes_back() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(0, 0, 20.0);
    let mut wifi = MockWifi::failing(3);
    let mut db = MockDb::ready();

    for now in [0, 10, 20, 30, 40] {
        svc.poll(now, &mut sensors, &mut wifi, &mut db, &mut sink);
    }

    // Three failures, one success, then the link is up.
    assert_eq!(wifi.connect_calls, 4);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WifiConnectFailed(_))), 3);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WifiConnected { .. })), 1);
}

#[test]
fn sampling_continues_while_offline() {
    let (mut svc, mut sink) = service();
    let mut sensors = MockSensors::steady(0, 0, 20.0);
    let mut wifi = MockWifi::failing(100);
    let mut db = MockDb::not_ready();

    for now in (0..=3_000).step_by(500) {
        svc.poll(now, &mut sensors, &mut wifi, &mut db, &mut sink);
    }

    assert_eq!(sensors.reads, 3);
    assert!(db.writes.is_empty());
}
