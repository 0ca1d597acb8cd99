//! Beamguard Server - read-only evidence publisher.
//!
//! This crate provides the HTTP component of Beamguard: a read-only
//! file listing/download service rooted at the evidence directory. It
//! runs as an independent worker task inside the controller process,
//! started before the detection loop begins and stopped last during
//! shutdown.
//!
//! # Architecture
//!
//! The publisher only ever reads the filesystem: the detection loop
//! completes every file write (including flush and close) before the
//! file is discoverable here, so no locking is needed between the two.

pub mod error;
pub mod publisher;
pub mod routes;

pub use error::PublisherError;
pub use publisher::EvidencePublisher;
pub use routes::{create_router, AppState};
