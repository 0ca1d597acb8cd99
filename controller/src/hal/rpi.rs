//! Raspberry Pi hardware backend: rppal GPIO lines and an OpenCV camera.
//!
//! Only compiled with the `hardware` feature. Pin numbers are BCM.

use std::path::Path;

use opencv::core::{Mat, Size};
use opencv::imgcodecs;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoWriter};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use super::{CameraDevice, DigitalInput, DigitalOutput, Frame, HalError, VideoRecorder};

impl From<rppal::gpio::Error> for HalError {
    fn from(err: rppal::gpio::Error) -> Self {
        HalError::Gpio(err.to_string())
    }
}

impl From<opencv::Error> for HalError {
    fn from(err: opencv::Error) -> Self {
        HalError::Camera(err.to_string())
    }
}

/// A GPIO input line.
pub struct GpioInput {
    pin: InputPin,
}

impl GpioInput {
    /// Claims the given BCM pin as an input.
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, HalError> {
        Ok(Self {
            pin: gpio.get(pin)?.into_input(),
        })
    }
}

impl DigitalInput for GpioInput {
    fn read(&mut self) -> Result<bool, HalError> {
        Ok(self.pin.is_high())
    }
}

/// A GPIO output line.
pub struct GpioOutput {
    pin: OutputPin,
}

impl GpioOutput {
    /// Claims the given BCM pin as an output.
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, HalError> {
        Ok(Self {
            pin: gpio.get(pin)?.into_output(),
        })
    }
}

impl DigitalOutput for GpioOutput {
    fn write(&mut self, high: bool) -> Result<(), HalError> {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// V4L2 camera via OpenCV, with the JPEG and AVI codecs it brings along.
pub struct OpenCvCamera {
    capture: VideoCapture,
    width: u32,
    height: u32,
    buffer: Mat,
}

impl OpenCvCamera {
    /// Opens camera `index`. Fails if the device cannot be opened, which
    /// aborts startup before the detection loop begins.
    pub fn open(index: i32) -> Result<Self, HalError> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(HalError::Camera(format!(
                "could not open camera index {index}"
            )));
        }
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        Ok(Self {
            capture,
            width,
            height,
            buffer: Mat::default(),
        })
    }

    fn mat_from_frame(frame: &Frame) -> Result<Mat, HalError> {
        let flat = Mat::from_slice(&frame.data)?;
        Ok(flat.reshape(3, frame.height as i32)?.try_clone()?)
    }
}

impl CameraDevice for OpenCvCamera {
    fn capture_frame(&mut self) -> Result<Frame, HalError> {
        if !self.capture.read(&mut self.buffer)? {
            return Err(HalError::Camera("empty frame from device".to_string()));
        }
        Ok(Frame::new(
            self.buffer.cols() as u32,
            self.buffer.rows() as u32,
            self.buffer.data_bytes()?.to_vec(),
        ))
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn save_still(&mut self, path: &Path, frame: &Frame) -> Result<(), HalError> {
        let mat = Self::mat_from_frame(frame)?;
        let written = imgcodecs::imwrite(
            &path.to_string_lossy(),
            &mat,
            &opencv::core::Vector::new(),
        )?;
        if !written {
            return Err(HalError::Camera(format!(
                "imwrite refused {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn open_recorder(&mut self, path: &Path, fps: f64) -> Result<Box<dyn VideoRecorder>, HalError> {
        let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
        let size = Size::new(self.width as i32, self.height as i32);
        let writer = VideoWriter::new(&path.to_string_lossy(), fourcc, fps, size, true)?;
        if !writer.is_opened()? {
            return Err(HalError::Camera(format!(
                "could not open video writer for {}",
                path.display()
            )));
        }
        Ok(Box::new(OpenCvRecorder { writer }))
    }
}

struct OpenCvRecorder {
    writer: VideoWriter,
}

impl VideoRecorder for OpenCvRecorder {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), HalError> {
        let mat = OpenCvCamera::mat_from_frame(frame)?;
        self.writer.write(&mat)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), HalError> {
        self.writer.release()?;
        Ok(())
    }
}
