//! Hardware abstraction boundary for the controller.
//!
//! The detection loop never touches pins, cameras or codecs directly; it
//! goes through the traits in this module. Every call is fallible — the
//! loop treats the hardware as an external collaborator that can refuse
//! service on any cycle.
//!
//! # Backends
//!
//! - [`sim`]: simulated inputs, outputs and camera. Always compiled; used
//!   by `--demo` and by the test suites.
//! - [`rpi`] (feature `hardware`): rppal GPIO and OpenCV camera/video
//!   backend for the Raspberry Pi target.

use std::path::Path;

use thiserror::Error;

pub mod sim;

#[cfg(feature = "hardware")]
pub mod rpi;

/// Errors surfaced by hardware collaborators.
#[derive(Error, Debug)]
pub enum HalError {
    /// GPIO line could not be read or driven.
    #[error("gpio error: {0}")]
    Gpio(String),

    /// Camera capture or codec failure.
    #[error("camera error: {0}")]
    Camera(String),

    /// Filesystem I/O while persisting a frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single digital sensor line. `true` is the electrically high level;
/// polarity interpretation belongs to the caller.
pub trait DigitalInput: Send {
    fn read(&mut self) -> Result<bool, HalError>;
}

/// A single digital actuator line.
pub trait DigitalOutput: Send {
    fn write(&mut self, high: bool) -> Result<(), HalError>;
}

/// One captured camera frame, shared between the snapshot and video
/// paths within a loop iteration. 8-bit BGR, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }
}

/// Camera driver: frame acquisition plus the still/video codecs that
/// ship with it.
pub trait CameraDevice: Send {
    /// Grabs the most recent frame from the device.
    fn capture_frame(&mut self) -> Result<Frame, HalError>;

    /// Native frame dimensions as reported by the device.
    fn frame_size(&self) -> (u32, u32);

    /// Encodes and writes a still image. The file is fully written and
    /// closed when this returns `Ok`.
    fn save_still(&mut self, path: &Path, frame: &Frame) -> Result<(), HalError>;

    /// Opens a video writer session at the given frame rate, sized to
    /// this camera's frames.
    fn open_recorder(&mut self, path: &Path, fps: f64) -> Result<Box<dyn VideoRecorder>, HalError>;
}

/// An open video writer session. Exactly one may exist at a time; the
/// recording state machine enforces this by owning the box.
pub trait VideoRecorder: Send {
    /// Appends one frame to the container.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), HalError>;

    /// Flushes and finalizes the container. The session is unusable
    /// afterwards; callers drop the box.
    fn finish(&mut self) -> Result<(), HalError>;
}

/// The audible actuator, wrapped so polarity stays a wiring detail.
///
/// The stock buzzer module sounds when the line is driven low.
pub struct Buzzer {
    line: Box<dyn DigitalOutput>,
    active_low: bool,
}

impl Buzzer {
    #[must_use]
    pub fn new(line: Box<dyn DigitalOutput>, active_low: bool) -> Self {
        Self { line, active_low }
    }

    /// Drives the buzzer on or off.
    pub fn set(&mut self, on: bool) -> Result<(), HalError> {
        self.line.write(on != self.active_low)
    }
}
