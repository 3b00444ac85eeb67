// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the Canvas exporter
//!
//! All tests use wiremock to mock the Canvas API - no real API calls are made.

use remediationbot::config::CanvasConfig;
use remediationbot::export::CanvasExporter;
use remediationbot::Error;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPORTS_PATH: &str = "/api/v1/courses/42/content_exports";
const STATUS_PATH: &str = "/api/v1/courses/42/content_exports/7";

fn mock_config(server_url: &str, max_attempts: u32) -> CanvasConfig {
    CanvasConfig {
        url: server_url.to_string(),
        token: "test-token".to_string(),
        course_id: "42".to_string(),
        poll_interval_secs: 0,
        max_attempts,
    }
}

async fn mount_export_request(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(EXPORTS_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("export_type=common_cartridge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7,
            "workflow_state": "created",
            "progress_url": "https://canvas.example.edu/api/v1/progress/1"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn status(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": 7,
        "workflow_state": state,
    }))
}

#[tokio::test]
async fn test_export_polls_then_downloads() {
    let server = MockServer::start().await;
    mount_export_request(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status("exporting"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7,
            "workflow_state": "exported",
            "attachment": {"url": format!("{}/files/99/download", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/99/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04 package bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let exporter = CanvasExporter::new(&mock_config(&server.uri(), 10)).unwrap();
    let package = exporter.export_course(dir.path()).await.unwrap();

    assert_eq!(package, dir.path().join("course_42_export.imscc"));
    assert_eq!(std::fs::read(&package).unwrap(), b"PK\x03\x04 package bytes");
}

#[tokio::test]
async fn test_failed_export_is_fatal() {
    let server = MockServer::start().await;
    mount_export_request(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status("failed"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let exporter = CanvasExporter::new(&mock_config(&server.uri(), 10)).unwrap();
    let err = exporter.export_course(dir.path()).await.unwrap_err();

    assert!(matches!(err, Error::ExportFailed(_)), "got {:?}", err);
    assert!(!dir.path().join("course_42_export.imscc").exists());
}

#[tokio::test]
async fn test_export_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    mount_export_request(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status("exporting"))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let exporter = CanvasExporter::new(&mock_config(&server.uri(), 3)).unwrap();
    let err = exporter.export_course(dir.path()).await.unwrap_err();

    assert!(matches!(err, Error::ExportTimedOut(3)), "got {:?}", err);
}

#[tokio::test]
async fn test_exported_without_attachment_keeps_polling() {
    let server = MockServer::start().await;
    mount_export_request(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status("exported"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let exporter = CanvasExporter::new(&mock_config(&server.uri(), 2)).unwrap();
    let err = exporter.export_course(dir.path()).await.unwrap_err();

    assert!(matches!(err, Error::ExportTimedOut(2)), "got {:?}", err);
}

#[tokio::test]
async fn test_rejected_token_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EXPORTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{"message": "Invalid access token."}]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let exporter = CanvasExporter::new(&mock_config(&server.uri(), 3)).unwrap();
    let err = exporter.export_course(dir.path()).await.unwrap_err();

    assert!(matches!(err, Error::Http(_)), "got {:?}", err);
}
