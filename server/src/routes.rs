//! HTTP route handlers for the evidence publisher.
//!
//! This module provides the read-only HTTP surface over the evidence
//! directory:
//!
//! - `GET /` - JSON listing of captured photos and videos
//! - `GET /files/{*path}` - Evidence downloads (photos, videos, events.csv)
//! - `GET /health` - Health check endpoint
//!
//! The publisher never writes: downloads are served by
//! `tower_http::services::ServeDir`, which answers GET/HEAD only and
//! refuses paths that escape the evidence root. Files become visible
//! here only after the detection loop has fully written and closed
//! them; the filesystem is the only resource shared with the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Evidence directory root.
    pub root: Arc<PathBuf>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state rooted at the given evidence directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// An axum `Router` with the following routes:
/// - `GET /` - Evidence listing
/// - `GET /files/{*path}` - Evidence downloads
/// - `GET /health` - Health check endpoint
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let files = ServeDir::new(state.root.to_path_buf());
    Router::new()
        .route("/", get(get_index))
        .route("/health", get(get_health))
        .nest_service("/files", files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Response Types
// ============================================================================

/// One downloadable evidence file.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    /// File name within its subdirectory.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Still captures under `photos/`.
    pub photos: Vec<FileEntry>,

    /// Recording sessions under `videos/`.
    pub videos: Vec<FileEntry>,

    /// Whether the event log exists yet.
    pub has_event_log: bool,
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// GET / - Evidence Listing
// ============================================================================

/// GET / - Lists the evidence directory.
///
/// Reads directory state at request time; entries are sorted by name,
/// which for the timestamped naming convention is chronological order.
async fn get_index(State(state): State<AppState>) -> Response {
    let photos = match list_dir(&state.root.join("photos")).await {
        Ok(entries) => entries,
        Err(e) => return listing_error(e),
    };
    let videos = match list_dir(&state.root.join("videos")).await {
        Ok(entries) => entries,
        Err(e) => return listing_error(e),
    };
    let has_event_log = tokio::fs::try_exists(state.root.join("events.csv"))
        .await
        .unwrap_or(false);

    Json(ListingResponse {
        photos,
        videos,
        has_event_log,
    })
    .into_response()
}

/// Collects the files of one evidence subdirectory. A missing directory
/// lists as empty rather than failing: the publisher may be asked before
/// the loop has captured anything.
async fn list_dir(dir: &Path) -> Result<Vec<FileEntry>, std::io::Error> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn listing_error(e: std::io::Error) -> Response {
    warn!(error = %e, "failed to list evidence directory");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "failed to list evidence directory".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

/// GET /health - Reports liveness and uptime.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_dir_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = list_dir(&dir.path().join("does-not-exist")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_dir_sorts_by_name_and_skips_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("suspect_20260102-000000.jpg"), b"b").unwrap();
        std::fs::write(dir.path().join("suspect_20260101-000000.jpg"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let entries = list_dir(dir.path()).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "suspect_20260101-000000.jpg");
        assert_eq!(entries[1].name, "suspect_20260102-000000.jpg");
        assert_eq!(entries[0].size, 1);
        assert!(entries[0].modified.is_some());
    }
}
