//! Motion-triggered video recording state machine.
//!
//! The open writer handle lives inside the `Recording` variant, so a
//! second simultaneous session is unrepresentable: the only code path
//! that opens a writer runs in the `Idle` state, and the only way out of
//! `Recording` releases the handle first.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::evidence::EvidenceStore;
use crate::hal::{CameraDevice, Frame, VideoRecorder};

enum State {
    Idle,
    Recording {
        recorder: Box<dyn VideoRecorder>,
        path: PathBuf,
    },
}

/// Tracks the motion-triggered recording session.
pub struct RecordingStateMachine {
    state: State,
    fps: f64,
}

impl RecordingStateMachine {
    #[must_use]
    pub fn new(fps: f64) -> Self {
        Self {
            state: State::Idle,
            fps,
        }
    }

    /// Path of the currently open session, if any. The alarm machine
    /// reads this at record-creation time so a photo event occurring
    /// mid-recording references the concurrently open video file.
    #[must_use]
    pub fn active_path(&self) -> Option<&Path> {
        match &self.state {
            State::Idle => None,
            State::Recording { path, .. } => Some(path),
        }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Advances the machine one cycle. On a motion edge a session is
    /// opened or closed; while recording, the cycle's shared frame is
    /// appended to the open session.
    pub fn update(
        &mut self,
        motion: bool,
        frame: Option<&Frame>,
        camera: &mut dyn CameraDevice,
        store: &EvidenceStore,
    ) {
        if motion {
            if matches!(self.state, State::Idle) {
                self.start(camera, store);
            }
            if let (State::Recording { recorder, path }, Some(frame)) = (&mut self.state, frame) {
                if let Err(e) = recorder.write_frame(frame) {
                    warn!(error = %e, path = %path.display(), "failed to write video frame");
                }
            }
        } else if self.is_recording() {
            self.stop();
        }
    }

    fn start(&mut self, camera: &mut dyn CameraDevice, store: &EvidenceStore) {
        let timestamp = EvidenceStore::timestamp();
        let path = store.video_path(&timestamp);
        match camera.open_recorder(&path, self.fps) {
            Ok(recorder) => {
                info!(path = %path.display(), fps = self.fps, "motion detected, recording started");
                self.state = State::Recording { recorder, path };
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to open recording session");
            }
        }
    }

    /// Finishes and releases the open session, if any. Also invoked from
    /// the shutdown sequence.
    pub fn stop(&mut self) {
        if let State::Recording { mut recorder, path } =
            std::mem::replace(&mut self.state, State::Idle)
        {
            match recorder.finish() {
                Ok(()) => info!(path = %path.display(), "recording closed"),
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "failed to finalize recording");
                }
            }
        }
    }
}
