//! Alert State Machine Integration Tests
//!
//! Tests for the alert generator through the public API:
//! - Transition rules at the trigger and resolve thresholds
//! - Out-of-range patient ids
//! - End-to-end runs against file and TCP sinks

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use vitals_stream::generators::trigger_probability;
use vitals_stream::{
    AlertState, AlertStateMachine, DataSink, FileSink, FixedRandom, PatientDataGenerator,
    SequenceRandom, Simulator, StreamSink,
};

const P: f64 = 0.095_162_581_964_040_4;

#[test]
fn test_trigger_threshold_for_default_rate() {
    let p = trigger_probability(0.1);
    assert!((p - (1.0 - (-0.1f64).exp())).abs() < 1e-9);
    assert!((p - P).abs() < 1e-12);

    let machine = AlertStateMachine::new(1, FixedRandom(0.5));
    assert!((machine.trigger_threshold() - p).abs() < 1e-15);
}

#[test]
fn test_draws_at_or_above_threshold_never_trigger() {
    for draw in [P + 1e-9, 0.1, 0.5, 0.999] {
        let mut machine = AlertStateMachine::new(1, FixedRandom(draw));
        for _ in 0..10 {
            assert!(machine.advance(1).unwrap().is_none());
        }
        assert_eq!(machine.state(1).unwrap(), AlertState::Resolved);
    }
}

#[test]
fn test_full_cycle() {
    // trigger, stay (0.95), stay (0.9), resolve (0.3)
    let mut machine = AlertStateMachine::new(1, SequenceRandom::new(vec![0.01, 0.95, 0.9, 0.3]));

    let triggered = machine.advance(1).unwrap().unwrap();
    assert_eq!((triggered.label.as_str(), triggered.value.as_str()), ("Alert", "triggered"));
    assert!(machine.advance(1).unwrap().is_none());
    assert!(machine.advance(1).unwrap().is_none());
    assert_eq!(machine.state(1).unwrap(), AlertState::Active);

    let resolved = machine.advance(1).unwrap().unwrap();
    assert_eq!(resolved.value, "resolved");
    assert_eq!(machine.state(1).unwrap(), AlertState::Resolved);
}

#[test]
fn test_patients_are_independent() {
    // Patient 1 draws 0.0 (trigger), patient 2 draws 0.5 (nothing)
    let mut machine = AlertStateMachine::new(2, SequenceRandom::new(vec![0.0, 0.5]));
    assert!(machine.advance(1).unwrap().is_some());
    assert!(machine.advance(2).unwrap().is_none());

    assert_eq!(machine.state(1).unwrap(), AlertState::Active);
    assert_eq!(machine.state(2).unwrap(), AlertState::Resolved);
}

#[test]
fn test_out_of_range_is_structured() {
    let mut machine = AlertStateMachine::new(3, FixedRandom(0.0));
    let err = machine.advance(7).unwrap_err();
    assert_eq!(err.patient_id, 7);
    assert_eq!(err.patient_count, 3);
}

#[test]
fn test_no_alerts_written_when_draw_is_high() {
    let temp_dir = TempDir::new().unwrap();
    let sink = FileSink::new(temp_dir.path()).unwrap();
    let mut machine = AlertStateMachine::new(3, FixedRandom(0.5));

    for patient_id in 1..=3 {
        assert!(machine.generate(patient_id, &sink).unwrap().is_none());
    }

    assert!(!temp_dir.path().join("Alert.txt").exists());
}

#[test]
fn test_simulator_writes_alert_lines() {
    let temp_dir = TempDir::new().unwrap();
    let sink = Arc::new(FileSink::new(temp_dir.path()).unwrap());
    let mut simulator = Simulator::new(3, sink);
    // Everyone triggers on the first tick and resolves on the second
    simulator.add_generator(
        Box::new(AlertStateMachine::new(3, FixedRandom(0.0))),
        Duration::from_secs(1),
    );

    let report = simulator.run_ticks(2);
    assert_eq!(report.events, 6);

    let content = fs::read_to_string(temp_dir.path().join("Alert.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("Patient ID: 1, Timestamp: "));
    assert!(lines[0].ends_with(", Label: Alert, Data: triggered"));
    assert!(lines[5].starts_with("Patient ID: 3, "));
    assert!(lines[5].ends_with("Data: resolved"));
}

#[tokio::test]
async fn test_no_alerts_streamed_when_draw_is_high() {
    let sink = StreamSink::bind_addr("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let client = TcpStream::connect(sink.local_addr()).await.unwrap();
    for _ in 0..200 {
        if sink.is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(sink.is_connected());

    let mut machine = AlertStateMachine::new(3, FixedRandom(0.5));
    for patient_id in 1..=3 {
        assert!(machine.generate(patient_id, &sink).unwrap().is_none());
    }
    sink.emit(0, 0, "Marker", "end").unwrap();

    // The marker is the first thing on the wire
    let mut lines = BufReader::new(client).lines();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "0,0,Marker,end");
}
