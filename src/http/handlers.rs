use super::state::AppState;
use crate::capture::{AudioMode, SourceSelector};
use crate::error::SessionError;
use crate::session::{format_file_size, ArtifactMeta, SessionState, SessionStatus};
use crate::store::StoreError;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    /// Screen, camera or tab
    pub source: SourceSelector,

    /// Audio to capture (default: both)
    #[serde(default)]
    pub audio: AudioMode,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: SessionState,
    pub message: String,
    pub recording: Option<RecordingSummary>,
}

#[derive(Debug, Serialize)]
pub struct SwitchSourceResponse {
    pub status: SessionStatus,
    /// Recording finished by the switch, if it produced data
    pub previous: Option<RecordingSummary>,
}

#[derive(Debug, Serialize)]
pub struct RecordingSummary {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    /// Human-readable size
    pub size_display: String,
}

impl From<ArtifactMeta> for RecordingSummary {
    fn from(meta: ArtifactMeta) -> Self {
        let size_display = format_file_size(meta.size);
        Self { meta, size_display }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_body(status: StatusCode, code: &str, error: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
        .into_response()
}

fn session_error(err: SessionError) -> Response {
    match &err {
        SessionError::Acquisition(acquisition) => {
            use crate::error::ErrorKind;

            let status = match acquisition.kind() {
                ErrorKind::PermissionDenied | ErrorKind::MicDenied => StatusCode::FORBIDDEN,
                ErrorKind::NoDevice => StatusCode::NOT_FOUND,
                ErrorKind::Unsupported
                | ErrorKind::ConstraintUnsatisfiable
                | ErrorKind::EmptyStream => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::RecorderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            };
            error_body(status, acquisition.kind().code(), acquisition.user_message())
        }
        SessionError::InvalidTransition { .. } => {
            error_body(StatusCode::CONFLICT, "INVALID_STATE", err.to_string())
        }
        SessionError::Encoder(_) => {
            error!("Encoder failure: {}", err);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "ENCODER_ERROR", err.to_string())
        }
        SessionError::Store(_) => {
            error!("Store failure: {}", err);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", err.to_string())
        }
    }
}

fn store_error(err: StoreError) -> Response {
    error!("Store failure: {}", err);
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", err.to_string())
}

fn not_found(id: Uuid) -> Response {
    error_body(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("Recording {} not found", id),
    )
}

// ============================================================================
// Recording control
// ============================================================================

/// Run a session operation on its own task
///
/// Axum drops the handler future when the client goes away. Start, stop
/// and switch must run to completion regardless, so they are detached
/// and the handler only waits for the response.
async fn detached(task: JoinHandle<Response>) -> Response {
    match task.await {
        Ok(response) => response,
        Err(err) => {
            error!("Session task failed: {}", err);
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Session task failed".to_string(),
            )
        }
    }
}

/// POST /recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> Response {
    info!("Start requested: {} (audio: {})", req.source, req.audio);

    let session = Arc::clone(&state.session);
    detached(tokio::spawn(async move {
        let mut session = session.lock().await;
        match session.start(req.source, req.audio).await {
            Ok(()) => (StatusCode::OK, Json(session.status())).into_response(),
            Err(err) => session_error(err),
        }
    }))
    .await
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    let session = Arc::clone(&state.session);
    detached(tokio::spawn(async move {
        let mut session = session.lock().await;

        match session.stop().await {
            Ok(Some(artifact)) => (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: session.state(),
                    message: format!("Recording saved as {}", artifact.filename()),
                    recording: Some(artifact.meta().clone().into()),
                }),
            )
                .into_response(),
            Ok(None) => (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: session.state(),
                    message: "Recording stopped with no data".to_string(),
                    recording: None,
                }),
            )
                .into_response(),
            Err(err) => session_error(err),
        }
    }))
    .await
}

/// POST /recording/pause
pub async fn pause_recording(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    match session.pause() {
        Ok(()) => (StatusCode::OK, Json(session.status())).into_response(),
        Err(err) => session_error(err),
    }
}

/// POST /recording/resume
pub async fn resume_recording(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    match session.resume() {
        Ok(()) => (StatusCode::OK, Json(session.status())).into_response(),
        Err(err) => session_error(err),
    }
}

/// POST /recording/toggle-pause
pub async fn toggle_pause(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    match session.toggle_pause() {
        Ok(_) => (StatusCode::OK, Json(session.status())).into_response(),
        Err(err) => session_error(err),
    }
}

/// POST /recording/switch
pub async fn switch_source(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> Response {
    let session = Arc::clone(&state.session);
    detached(tokio::spawn(async move {
        let mut session = session.lock().await;
        match session.switch_source(req.source, req.audio).await {
            Ok(previous) => (
                StatusCode::OK,
                Json(SwitchSourceResponse {
                    status: session.status(),
                    previous: previous.map(|artifact| artifact.meta().clone().into()),
                }),
            )
                .into_response(),
            Err(err) => session_error(err),
        }
    }))
    .await
}

/// GET /recording/status
pub async fn get_status(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    session.process_pending();
    (StatusCode::OK, Json(session.status())).into_response()
}

// ============================================================================
// Stored recordings
// ============================================================================

/// GET /recordings
/// Most recent first, the way the list is shown
pub async fn list_recordings(State(state): State<AppState>) -> Response {
    match state.store.list() {
        Ok(mut recordings) => {
            recordings.reverse();
            let summaries: Vec<RecordingSummary> =
                recordings.into_iter().map(RecordingSummary::from).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(err) => store_error(err),
    }
}

/// GET /recordings/:id
/// Download the encoded bytes
pub async fn download_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store.get(id) {
        Ok(Some(artifact)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, artifact.mime_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.filename()),
                ),
            ],
            artifact.bytes().to_vec(),
        )
            .into_response(),
        Ok(None) => not_found(id),
        Err(err) => store_error(err),
    }
}

/// DELETE /recordings/:id
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store.delete(id) {
        Ok(true) => {
            info!("Deleted recording {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found(id),
        Err(err) => store_error(err),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
