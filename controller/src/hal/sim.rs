//! Simulated hardware backend.
//!
//! Stands in for the GPIO lines and the camera when running in `--demo`
//! mode or under test. Inputs replay a configurable pattern, outputs
//! record every level they were driven to, and the camera synthesizes
//! deterministic frames and writes plain byte dumps where the real
//! backend would encode JPEG/AVI.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{CameraDevice, DigitalInput, DigitalOutput, Frame, HalError, VideoRecorder};

/// Frame dimensions used by the simulated camera. Deliberately small so
/// demo recordings stay cheap.
const SIM_FRAME_WIDTH: u32 = 64;
const SIM_FRAME_HEIGHT: u32 = 48;

/// A digital input that replays a pattern.
pub struct SimInput {
    pattern: Pattern,
}

enum Pattern {
    /// Always the same level.
    Steady(bool),
    /// Plays the script once, then holds the idle level.
    Script { seq: VecDeque<bool>, idle: bool },
    /// Repeats `low_samples` low readings followed by `high_samples`
    /// high readings.
    Cycle {
        low_samples: usize,
        high_samples: usize,
        pos: usize,
    },
}

impl SimInput {
    /// An input pinned at one level.
    #[must_use]
    pub fn steady(level: bool) -> Self {
        Self {
            pattern: Pattern::Steady(level),
        }
    }

    /// Replays `seq` one reading at a time, then holds `idle` forever.
    #[must_use]
    pub fn script(seq: impl IntoIterator<Item = bool>, idle: bool) -> Self {
        Self {
            pattern: Pattern::Script {
                seq: seq.into_iter().collect(),
                idle,
            },
        }
    }

    /// Endless low/high square wave, expressed in sample counts.
    #[must_use]
    pub fn cycle(low_samples: usize, high_samples: usize) -> Self {
        Self {
            pattern: Pattern::Cycle {
                low_samples,
                high_samples,
                pos: 0,
            },
        }
    }
}

impl DigitalInput for SimInput {
    fn read(&mut self) -> Result<bool, HalError> {
        let level = match &mut self.pattern {
            Pattern::Steady(level) => *level,
            Pattern::Script { seq, idle } => seq.pop_front().unwrap_or(*idle),
            Pattern::Cycle {
                low_samples,
                high_samples,
                pos,
            } => {
                let period = *low_samples + *high_samples;
                let level = *pos % period >= *low_samples;
                *pos = (*pos + 1) % period;
                level
            }
        };
        Ok(level)
    }
}

/// A digital output that records every level written to it.
pub struct SimOutput {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl SimOutput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded level history; clone before boxing the
    /// output so tests can inspect it afterwards.
    #[must_use]
    pub fn levels(&self) -> Arc<Mutex<Vec<bool>>> {
        Arc::clone(&self.levels)
    }
}

impl Default for SimOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalOutput for SimOutput {
    fn write(&mut self, high: bool) -> Result<(), HalError> {
        self.levels.lock().unwrap().push(high);
        Ok(())
    }
}

/// Shared observation and fault-injection knobs for [`SimCamera`].
///
/// The camera is boxed and moved into the controller; tests keep a clone
/// of this handle to flip failures and read counters from outside.
#[derive(Clone, Default)]
pub struct SimCameraProbe {
    fail_capture: Arc<AtomicBool>,
    fail_still: Arc<AtomicBool>,
    open_recorders: Arc<AtomicUsize>,
    recorders_opened: Arc<AtomicUsize>,
    stills_saved: Arc<AtomicUsize>,
}

impl SimCameraProbe {
    /// Makes every subsequent `capture_frame` fail.
    pub fn set_fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `save_still` fail.
    pub fn set_fail_still(&self, fail: bool) {
        self.fail_still.store(fail, Ordering::SeqCst);
    }

    /// Number of recorder sessions currently open.
    #[must_use]
    pub fn open_recorders(&self) -> usize {
        self.open_recorders.load(Ordering::SeqCst)
    }

    /// Total recorder sessions ever opened.
    #[must_use]
    pub fn recorders_opened(&self) -> usize {
        self.recorders_opened.load(Ordering::SeqCst)
    }

    /// Total stills successfully saved.
    #[must_use]
    pub fn stills_saved(&self) -> usize {
        self.stills_saved.load(Ordering::SeqCst)
    }
}

/// Synthetic camera producing counter-stamped frames.
pub struct SimCamera {
    counter: u8,
    probe: SimCameraProbe,
}

impl SimCamera {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: 0,
            probe: SimCameraProbe::default(),
        }
    }

    /// The observation/fault-injection handle for this camera.
    #[must_use]
    pub fn probe(&self) -> SimCameraProbe {
        self.probe.clone()
    }
}

impl Default for SimCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDevice for SimCamera {
    fn capture_frame(&mut self) -> Result<Frame, HalError> {
        if self.probe.fail_capture.load(Ordering::SeqCst) {
            return Err(HalError::Camera("simulated capture failure".to_string()));
        }
        self.counter = self.counter.wrapping_add(1);
        let len = (SIM_FRAME_WIDTH * SIM_FRAME_HEIGHT * 3) as usize;
        Ok(Frame::new(
            SIM_FRAME_WIDTH,
            SIM_FRAME_HEIGHT,
            vec![self.counter; len],
        ))
    }

    fn frame_size(&self) -> (u32, u32) {
        (SIM_FRAME_WIDTH, SIM_FRAME_HEIGHT)
    }

    fn save_still(&mut self, path: &Path, frame: &Frame) -> Result<(), HalError> {
        if self.probe.fail_still.load(Ordering::SeqCst) {
            return Err(HalError::Camera("simulated still failure".to_string()));
        }
        let mut file = File::create(path)?;
        file.write_all(&frame.data)?;
        file.sync_all()?;
        self.probe.stills_saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn open_recorder(&mut self, path: &Path, _fps: f64) -> Result<Box<dyn VideoRecorder>, HalError> {
        let file = File::create(path)?;
        self.probe.open_recorders.fetch_add(1, Ordering::SeqCst);
        self.probe.recorders_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimRecorder {
            file,
            open_recorders: Arc::clone(&self.probe.open_recorders),
            finished: false,
        }))
    }
}

/// File-backed recorder that appends raw frame bytes.
struct SimRecorder {
    file: File,
    open_recorders: Arc<AtomicUsize>,
    finished: bool,
}

impl VideoRecorder for SimRecorder {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), HalError> {
        self.file.write_all(&frame.data)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), HalError> {
        if !self.finished {
            self.finished = true;
            self.open_recorders.fetch_sub(1, Ordering::SeqCst);
        }
        self.file.sync_all()?;
        Ok(())
    }
}
