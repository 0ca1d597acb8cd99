//! Evidence directory layout and artifact naming.
//!
//! The store owns the on-disk convention shared by the two state
//! machines and the event logger:
//!
//! ```text
//! <root>/
//!   photos/suspect_<YYYYMMDD-HHMMSS>.jpg
//!   videos/video_<YYYYMMDD-HHMMSS>.avi
//!   events.csv
//! ```
//!
//! Timestamps are local time at second resolution; two artifacts of the
//! same kind created within the same second would collide. The state
//! machines cannot re-trigger without an intervening clear cycle, so the
//! risk is accepted as a known limitation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

/// Subdirectory holding still captures.
const PHOTOS_DIR: &str = "photos";

/// Subdirectory holding recording sessions.
const VIDEOS_DIR: &str = "videos";

/// The append-only event log file.
const LOG_FILE: &str = "events.csv";

/// Errors raised while preparing the evidence directory.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A directory could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Evidence directory handle.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    root: PathBuf,
}

impl EvidenceStore {
    /// Opens the store at `root`, creating the directory tree if absent.
    /// Existing contents are left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let store = Self { root };
        for dir in [
            store.root.clone(),
            store.photos_dir(),
            store.videos_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Create {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn photos_dir(&self) -> PathBuf {
        self.root.join(PHOTOS_DIR)
    }

    #[must_use]
    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS_DIR)
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Current local time in the artifact naming format.
    #[must_use]
    pub fn timestamp() -> String {
        Local::now().format("%Y%m%d-%H%M%S").to_string()
    }

    /// Path for a still capture taken at `timestamp`.
    #[must_use]
    pub fn photo_path(&self, timestamp: &str) -> PathBuf {
        self.photos_dir().join(format!("suspect_{timestamp}.jpg"))
    }

    /// Path for a recording session opened at `timestamp`.
    #[must_use]
    pub fn video_path(&self, timestamp: &str) -> PathBuf {
        self.videos_dir().join(format!("video_{timestamp}.avi"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("evidence");

        let store = EvidenceStore::init(&root).unwrap();

        assert!(store.photos_dir().is_dir());
        assert!(store.videos_dir().is_dir());
        assert!(!store.log_path().exists());
    }

    #[test]
    fn test_init_is_idempotent_and_preserves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("evidence");

        let store = EvidenceStore::init(&root).unwrap();
        let marker = store.photos_dir().join("suspect_20260101-000000.jpg");
        std::fs::write(&marker, b"jpeg").unwrap();

        EvidenceStore::init(&root).unwrap();
        assert_eq!(std::fs::read(&marker).unwrap(), b"jpeg");
    }

    #[test]
    fn test_artifact_naming_convention() {
        let store = EvidenceStore {
            root: PathBuf::from("/data/evidence"),
        };
        assert_eq!(
            store.photo_path("20260314-151623"),
            PathBuf::from("/data/evidence/photos/suspect_20260314-151623.jpg")
        );
        assert_eq!(
            store.video_path("20260314-151623"),
            PathBuf::from("/data/evidence/videos/video_20260314-151623.avi")
        );
    }

    #[test]
    fn test_timestamp_format_shape() {
        let ts = EvidenceStore::timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'-');
        assert!(ts[..8].bytes().all(|b| b.is_ascii_digit()));
        assert!(ts[9..].bytes().all(|b| b.is_ascii_digit()));
    }
}
