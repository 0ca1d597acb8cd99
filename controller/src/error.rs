//! Error types for the Beamguard controller.
//!
//! This module defines the error types used throughout the controller
//! crate, providing structured error handling with clear, human-readable
//! messages. Mid-loop failures are handled in place (logged, retried
//! next cycle); the variants here are the ones that abort startup or
//! surface at the binary edge.

use thiserror::Error;

use crate::config::ConfigError;
use crate::evidence::StoreError;
use crate::event_log::LogError;
use crate::hal::HalError;

/// Errors that can occur during controller operations.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Hardware boundary error (GPIO, camera, codecs).
    #[error("hardware error: {0}")]
    Hal(#[from] HalError),

    /// Evidence directory could not be prepared.
    #[error("evidence store error: {0}")]
    Store(#[from] StoreError),

    /// Event log could not be opened or written.
    #[error("event log error: {0}")]
    Log(#[from] LogError),

    /// Evidence publisher could not be started or stopped.
    #[error("publisher error: {0}")]
    Publisher(#[from] beamguard_server::PublisherError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
