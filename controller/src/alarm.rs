//! Beam-break alarm state machine.
//!
//! Transitions fire on edges of the debounced beam-break signal, never
//! on sustained levels: a hazard reading while already alarming is a
//! no-op, as is a clear reading while armed. Each trigger actuates the
//! buzzer, captures a still from the cycle's shared frame and appends
//! one event record — in that order, so a record never references an
//! image that was not fully written.

use std::path::Path;

use tracing::{info, warn};

use crate::evidence::EvidenceStore;
use crate::event_log::{EventLogger, EventRecord};
use crate::hal::{Buzzer, CameraDevice, Frame};
use crate::sensors::SensorSnapshot;

/// Alarm machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// Watching for a confirmed beam break.
    Armed,
    /// Beam break confirmed; buzzer is sounding.
    Alarming,
}

/// Tracks the alarm state and owns the buzzer actuator.
pub struct AlarmStateMachine {
    state: AlarmState,
    buzzer: Buzzer,
}

impl AlarmStateMachine {
    /// Creates the machine in the `Armed` state. The buzzer is not
    /// actuated until the first transition.
    #[must_use]
    pub fn new(buzzer: Buzzer) -> Self {
        Self {
            state: AlarmState::Armed,
            buzzer,
        }
    }

    #[must_use]
    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Advances the machine one cycle.
    ///
    /// `video_path` is the recording session open at this instant, if
    /// any; a trigger occurring mid-recording logs a reference to it.
    /// Capture and storage failures are reported and the transition
    /// still completes — the buzzer must never get stuck — but the event
    /// record for a failed capture is skipped rather than left dangling.
    pub fn update(
        &mut self,
        snapshot: &SensorSnapshot,
        frame: Option<&Frame>,
        camera: &mut dyn CameraDevice,
        store: &EvidenceStore,
        logger: &mut EventLogger,
        video_path: Option<&Path>,
    ) {
        match self.state {
            AlarmState::Armed if snapshot.laser_hazard => {
                self.trigger(snapshot, frame, camera, store, logger, video_path);
            }
            AlarmState::Alarming if !snapshot.laser_hazard => {
                self.clear();
            }
            _ => {}
        }
    }

    fn trigger(
        &mut self,
        snapshot: &SensorSnapshot,
        frame: Option<&Frame>,
        camera: &mut dyn CameraDevice,
        store: &EvidenceStore,
        logger: &mut EventLogger,
        video_path: Option<&Path>,
    ) {
        info!("beam break confirmed, activating alarm");
        self.state = AlarmState::Alarming;
        if let Err(e) = self.buzzer.set(true) {
            warn!(error = %e, "failed to activate buzzer");
        }

        let timestamp = EvidenceStore::timestamp();
        let image = store.photo_path(&timestamp);
        let captured = match frame {
            Some(frame) => match camera.save_still(&image, frame) {
                Ok(()) => {
                    info!(path = %image.display(), "still captured");
                    true
                }
                Err(e) => {
                    warn!(error = %e, path = %image.display(), "failed to save still, skipping event record");
                    false
                }
            },
            None => {
                warn!("no frame available, skipping still capture and event record");
                false
            }
        };

        if captured {
            let record = EventRecord {
                timestamp,
                laser: true,
                pir: snapshot.motion,
                image,
                video: video_path.map(Path::to_path_buf),
            };
            if let Err(e) = logger.append(&record) {
                warn!(error = %e, "failed to append event record");
            }
        }
    }

    fn clear(&mut self) {
        info!("beam restored, alarm cleared");
        self.state = AlarmState::Armed;
        if let Err(e) = self.buzzer.set(false) {
            warn!(error = %e, "failed to deactivate buzzer");
        }
    }

    /// Releases the buzzer to its inactive level if it is sounding.
    /// Called from the shutdown sequence.
    pub fn silence(&mut self) {
        if self.state == AlarmState::Alarming {
            self.clear();
        }
    }
}
