//! Error types for the evidence publisher.

use thiserror::Error;

/// Errors that can occur while starting the publisher.
#[derive(Error, Debug)]
pub enum PublisherError {
    /// The listener could not be bound to the requested port.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },

    /// The bound listener's address could not be determined.
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
