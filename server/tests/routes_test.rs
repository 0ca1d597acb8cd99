//! Integration tests for the evidence publisher routes.
//!
//! These exercise the router directly with `tower::ServiceExt::oneshot`:
//! listing, downloads, unknown paths, and the read-only guarantees.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use beamguard_server::routes::{create_router, AppState};

// ============================================================================
// Test Helpers
// ============================================================================

/// Builds an evidence directory with one photo, one video and a log.
fn populated_evidence() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("photos")).unwrap();
    std::fs::create_dir(dir.path().join("videos")).unwrap();
    std::fs::write(
        dir.path().join("photos/suspect_20260314-151623.jpg"),
        b"jpeg bytes",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("videos/video_20260314-151620.avi"),
        b"avi bytes",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("events.csv"),
        "Timestamp, Laser, Pir, Image, Video\n",
    )
    .unwrap();
    dir
}

fn router_for(dir: &tempfile::TempDir) -> axum::Router {
    create_router(AppState::new(dir.path().to_path_buf()))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ============================================================================
// GET / - Listing
// ============================================================================

#[tokio::test]
async fn test_index_lists_photos_videos_and_log() {
    let dir = populated_evidence();
    let app = router_for(&dir);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert_eq!(json["photos"].as_array().unwrap().len(), 1);
    assert_eq!(json["photos"][0]["name"], "suspect_20260314-151623.jpg");
    assert_eq!(json["photos"][0]["size"], 10);
    assert_eq!(json["videos"][0]["name"], "video_20260314-151620.avi");
    assert_eq!(json["has_event_log"], true);
}

#[tokio::test]
async fn test_index_on_empty_store_lists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = router_for(&dir);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(json["photos"].as_array().unwrap().is_empty());
    assert!(json["videos"].as_array().unwrap().is_empty());
    assert_eq!(json["has_event_log"], false);
}

// ============================================================================
// GET /files - Downloads
// ============================================================================

#[tokio::test]
async fn test_download_photo_returns_file_bytes() {
    let dir = populated_evidence();
    let app = router_for(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/files/photos/suspect_20260314-151623.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"jpeg bytes");
}

#[tokio::test]
async fn test_download_event_log() {
    let dir = populated_evidence();
    let app = router_for(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/files/events.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert!(body.starts_with(b"Timestamp, Laser, Pir, Image, Video"));
}

#[tokio::test]
async fn test_unknown_file_is_404() {
    let dir = populated_evidence();
    let app = router_for(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/files/photos/suspect_19990101-000000.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_outside_root_is_rejected() {
    let dir = populated_evidence();
    std::fs::write(dir.path().parent().unwrap().join("outside.txt"), b"secret").unwrap();
    let app = router_for(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/files/../outside.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Read-only guarantees
// ============================================================================

#[tokio::test]
async fn test_non_get_methods_are_rejected() {
    let dir = populated_evidence();

    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let app = router_for(&dir);
        let response = app
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri("/files/photos/suspect_20260314-151623.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} should be rejected"
        );
    }
}

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn test_health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = router_for(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["uptime_seconds"].is_u64());
}
