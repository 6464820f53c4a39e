// Integration tests for the HTTP control API
//
// Requests go straight through the router with `oneshot`; no socket is
// bound. The session runs on the simulated backends.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use web_recorder::capture::CaptureError;
use web_recorder::session::{RecordingSession, SessionConfig};
use web_recorder::sim::{CaptureScript, EncoderScript, SimulatedCapture, SimulatedEncoder};
use web_recorder::store::MemoryStore;
use web_recorder::{create_router, AppState};

struct TestApp {
    router: Router,
    encoder: Arc<SimulatedEncoder>,
}

fn app_with(capture: CaptureScript) -> TestApp {
    let encoder = Arc::new(SimulatedEncoder::new(EncoderScript::default()));
    let config = SessionConfig {
        flush_timeout_ms: 200,
        switch_settle_ms: 10,
        ..SessionConfig::default()
    };
    let session = RecordingSession::new(
        config,
        Arc::new(SimulatedCapture::new(capture)),
        encoder.clone(),
        Arc::new(MemoryStore::default()),
    );

    TestApp {
        router: create_router(AppState::new(session)),
        encoder,
    }
}

fn app() -> TestApp {
    app_with(CaptureScript::default())
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Vec<u8>)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, bytes.to_vec()))
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let (status, bytes) = send(router, method, uri, body).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    Ok(())
}

#[tokio::test]
async fn test_record_stop_and_download() -> Result<()> {
    let app = app();

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/recording/start",
        Some(json!({ "source": "screen", "audio": "both" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "recording");
    assert_eq!(body["tracks"].as_array().map(Vec::len), Some(3));

    app.encoder.emit(b"encoded".to_vec());

    let (status, body) = send_json(&app.router, "GET", "/recording/status", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chunks_count"], 1);

    let (status, body) = send_json(&app.router, "POST", "/recording/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["recording"]["size"], 7);
    let id = body["recording"]["id"].as_str().expect("id is a string").to_string();

    let (status, list) = send_json(&app.router, "GET", "/recordings", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["size_display"], "7 Bytes");

    let (status, bytes) = send(&app.router, "GET", &format!("/recordings/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"encoded");

    let (status, _) = send(&app.router, "DELETE", &format!("/recordings/{}", id), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_json(&app.router, "GET", &format!("/recordings/{}", id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_start_defaults_to_both_audio() -> Result<()> {
    let app = app();

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/recording/start",
        Some(json!({ "source": "tab" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["audio_mode"], "both");
    assert_eq!(body["source"], "tab");
    Ok(())
}

#[tokio::test]
async fn test_pause_toggle_and_resume() -> Result<()> {
    let app = app();
    send(
        &app.router,
        "POST",
        "/recording/start",
        Some(json!({ "source": "camera", "audio": "none" })),
    )
    .await?;

    let (status, body) = send_json(&app.router, "POST", "/recording/pause", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "paused");

    let (_, body) = send_json(&app.router, "POST", "/recording/toggle-pause", None).await?;
    assert_eq!(body["state"], "recording");

    let (status, body) = send_json(&app.router, "POST", "/recording/resume", None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
    Ok(())
}

#[tokio::test]
async fn test_stop_when_idle_is_conflict() -> Result<()> {
    let app = app();
    let (status, body) = send_json(&app.router, "POST", "/recording/stop", None).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
    Ok(())
}

#[tokio::test]
async fn test_mic_denied_maps_to_forbidden() -> Result<()> {
    let app = app_with(CaptureScript {
        mic_error: Some(CaptureError::NotAllowed("blocked".to_string())),
        ..Default::default()
    });

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/recording/start",
        Some(json!({ "source": "camera", "audio": "mic" })),
    )
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "MIC_DENIED");
    assert!(body["error"]
        .as_str()
        .is_some_and(|msg| msg.contains("microphone")));

    let (_, status_body) = send_json(&app.router, "GET", "/recording/status", None).await?;
    assert_eq!(status_body["state"], "idle");
    Ok(())
}

#[tokio::test]
async fn test_switch_returns_previous_recording() -> Result<()> {
    let app = app();
    send(
        &app.router,
        "POST",
        "/recording/start",
        Some(json!({ "source": "screen", "audio": "none" })),
    )
    .await?;
    app.encoder.emit(b"first".to_vec());

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/recording/switch",
        Some(json!({ "source": "camera", "audio": "none" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["source"], "camera");
    assert_eq!(body["previous"]["size"], 5);
    Ok(())
}
