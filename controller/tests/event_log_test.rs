//! Event log durability across simulated process restarts.

use beamguard_controller::alarm::AlarmStateMachine;
use beamguard_controller::evidence::EvidenceStore;
use beamguard_controller::event_log::{EventLogger, LOG_HEADER};
use beamguard_controller::hal::sim::{SimCamera, SimOutput};
use beamguard_controller::hal::{Buzzer, CameraDevice};
use beamguard_controller::sensors::SensorSnapshot;

fn trigger_once(store: &EvidenceStore, logger: &mut EventLogger) {
    let mut camera = SimCamera::new();
    let frame = camera.capture_frame().unwrap();
    let mut alarm = AlarmStateMachine::new(Buzzer::new(Box::new(SimOutput::new()), true));
    alarm.update(
        &SensorSnapshot {
            laser_hazard: true,
            motion: false,
        },
        Some(&frame),
        &mut camera,
        store,
        logger,
        None,
    );
}

#[test]
fn test_restarts_append_and_never_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("evidence");

    // First process lifetime.
    {
        let store = EvidenceStore::init(&root).unwrap();
        let mut logger = EventLogger::open(&store.log_path()).unwrap();
        trigger_once(&store, &mut logger);
    }
    let after_first = std::fs::read_to_string(root.join("events.csv")).unwrap();

    // Second process lifetime: prior rows must be preserved verbatim.
    {
        let store = EvidenceStore::init(&root).unwrap();
        let mut logger = EventLogger::open(&store.log_path()).unwrap();
        trigger_once(&store, &mut logger);
    }
    let after_second = std::fs::read_to_string(root.join("events.csv")).unwrap();

    assert!(after_second.starts_with(&after_first));

    let lines: Vec<&str> = after_second.lines().collect();
    assert_eq!(lines.len(), 3);
    // Header appears exactly once regardless of restart count.
    assert_eq!(lines.iter().filter(|&&l| l == LOG_HEADER).count(), 1);
    assert_eq!(lines[0], LOG_HEADER);
}

#[test]
fn test_every_record_references_an_existing_image() {
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::init(dir.path().join("evidence")).unwrap();
    let mut logger = EventLogger::open(&store.log_path()).unwrap();

    trigger_once(&store, &mut logger);

    let contents = std::fs::read_to_string(store.log_path()).unwrap();
    for row in contents.lines().skip(1) {
        let image = row.split(',').nth(3).unwrap();
        assert!(
            std::path::Path::new(image).is_file(),
            "log references missing image {image}"
        );
    }
}
