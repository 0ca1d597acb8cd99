//! Append-only event log.
//!
//! One row is appended per alarm trigger, linking the trigger timestamp
//! to the evidence files it produced. The log is opened once at startup
//! in append mode and is never rewritten or truncated; every append is
//! synced to disk before it returns because the process may be
//! interrupted at any point.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fixed header row, written only when the log file is first created.
pub const LOG_HEADER: &str = "Timestamp, Laser, Pir, Image, Video";

/// Errors raised by the event logger.
#[derive(Error, Debug)]
pub enum LogError {
    /// The log file could not be opened or written.
    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One logged alarm event.
///
/// `video` is the recording session open at the instant the alarm fired,
/// if any; the row's field is left empty otherwise. A record is only
/// ever constructed after its image file has been fully written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub timestamp: String,
    pub laser: bool,
    pub pir: bool,
    pub image: PathBuf,
    pub video: Option<PathBuf>,
}

impl EventRecord {
    fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.timestamp,
            u8::from(self.laser),
            u8::from(self.pir),
            self.image.display(),
            self.video
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )
    }
}

/// Durable append-only writer for `events.csv`.
pub struct EventLogger {
    file: File,
}

impl EventLogger {
    /// Opens the log in append mode, writing the header only if the file
    /// did not previously exist (or was empty). Prior rows are preserved
    /// untouched across restarts.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let needs_header = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if needs_header {
            file.write_all(LOG_HEADER.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_data()?;
        }
        Ok(Self { file })
    }

    /// Appends exactly one row and syncs it to disk before returning.
    pub fn append(&mut self, record: &EventRecord) -> Result<(), LogError> {
        let mut row = record.to_row();
        row.push('\n');
        self.file.write_all(row.as_bytes())?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Final sync, called from the shutdown sequence. Appends are synced
    /// individually, so this only matters if the last one failed.
    pub fn sync(&mut self) -> Result<(), LogError> {
        self.file.sync_data()?;
        Ok(())
    }
}
