//! The detection-and-recording control loop.
//!
//! Single-threaded and cooperative: each iteration performs the two
//! blocking sensor samples, refreshes the shared camera frame, then
//! evaluates both state machines synchronously. No iteration overlaps
//! another. Termination is signalled through a `watch` channel; the
//! ordered cleanup sequence runs whether the loop ended by request or
//! by error.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::alarm::AlarmStateMachine;
use crate::evidence::EvidenceStore;
use crate::event_log::EventLogger;
use crate::hal::{CameraDevice, Frame};
use crate::recording::RecordingStateMachine;
use crate::sensors::{SensorSampler, SensorSnapshot};

/// Owns every moving part of the detection loop.
pub struct Controller {
    sampler: SensorSampler,
    alarm: AlarmStateMachine,
    recording: RecordingStateMachine,
    camera: Box<dyn CameraDevice>,
    store: EvidenceStore,
    logger: EventLogger,
    /// Most recent frame, shared by the snapshot and video paths. May be
    /// stale by up to one sample interval after a capture failure.
    frame: Option<Frame>,
}

impl Controller {
    #[must_use]
    pub fn new(
        sampler: SensorSampler,
        alarm: AlarmStateMachine,
        recording: RecordingStateMachine,
        camera: Box<dyn CameraDevice>,
        store: EvidenceStore,
        logger: EventLogger,
    ) -> Self {
        Self {
            sampler,
            alarm,
            recording,
            camera,
            store,
            logger,
            frame: None,
        }
    }

    /// Runs the loop until `shutdown` flips to `true`, then performs the
    /// cleanup sequence: buzzer released, emitter de-asserted, open
    /// recording finished, event log synced. The camera handle is
    /// released when the controller is dropped.
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) {
        // Prime the shared frame so the very first trigger has something
        // to capture.
        match self.camera.capture_frame() {
            Ok(frame) => self.frame = Some(frame),
            Err(e) => warn!(error = %e, "initial frame capture failed"),
        }

        info!("detection loop started");
        // The flag is checked between iterations, never mid-sample: the
        // emitter pulse sequence stays atomic and the loop stops before
        // the next blocking sample begins.
        while !*shutdown.borrow() {
            let snapshot = self.sampler.sample().await;
            self.tick(&snapshot);
        }
        info!("detection loop stopped");

        self.shutdown();
    }

    /// One synchronous evaluation of both state machines against the
    /// cycle's snapshot.
    fn tick(&mut self, snapshot: &SensorSnapshot) {
        match self.camera.capture_frame() {
            Ok(frame) => self.frame = Some(frame),
            Err(e) => warn!(error = %e, "frame capture failed, reusing previous frame"),
        }

        // Recording first: a trigger in the same cycle then references
        // the session opened for it.
        self.recording.update(
            snapshot.motion,
            self.frame.as_ref(),
            &mut *self.camera,
            &self.store,
        );
        self.alarm.update(
            snapshot,
            self.frame.as_ref(),
            &mut *self.camera,
            &self.store,
            &mut self.logger,
            self.recording.active_path(),
        );
    }

    /// Ordered, best-effort cleanup. Each step runs regardless of
    /// earlier failures.
    fn shutdown(&mut self) {
        self.alarm.silence();
        self.sampler.quiesce();
        self.recording.stop();
        if let Err(e) = self.logger.sync() {
            warn!(error = %e, "failed to sync event log during shutdown");
        }
        info!("controller shutdown sequence complete");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::hal::sim::{SimCamera, SimInput, SimOutput};
    use crate::hal::Buzzer;
    use crate::sensors::DebounceFilter;

    fn build(
        laser: SimInput,
        pir: SimInput,
        dir: &tempfile::TempDir,
    ) -> (Controller, crate::hal::sim::SimCameraProbe) {
        let store = EvidenceStore::init(dir.path().join("evidence")).unwrap();
        let logger = EventLogger::open(&store.log_path()).unwrap();
        let camera = SimCamera::new();
        let probe = camera.probe();
        let sampler = SensorSampler::new(
            Box::new(laser),
            Box::new(pir),
            None,
            DebounceFilter::new(10, true),
            Duration::from_millis(1),
        );
        let alarm = AlarmStateMachine::new(Buzzer::new(Box::new(SimOutput::new()), true));
        let recording = RecordingStateMachine::new(10.0);
        let controller = Controller::new(
            sampler,
            alarm,
            recording,
            Box::new(camera),
            store,
            logger,
        );
        (controller, probe)
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _probe) = build(
            SimInput::steady(true),
            SimInput::steady(false),
            &dir,
        );
        let (tx, rx) = watch::channel(false);

        let run = tokio::spawn(async move {
            controller.run(rx).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("loop should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_recording() {
        let dir = tempfile::tempdir().unwrap();
        // Motion held high: a session opens and stays open.
        let (mut controller, probe) = build(
            SimInput::steady(true),
            SimInput::steady(true),
            &dir,
        );
        let (tx, rx) = watch::channel(false);

        let run = tokio::spawn(async move {
            controller.run(rx).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(probe.open_recorders(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(probe.open_recorders(), 0);
        assert_eq!(probe.recorders_opened(), 1);
    }
}
