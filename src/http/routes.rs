use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/pause", post(handlers::pause_recording))
        .route("/recording/resume", post(handlers::resume_recording))
        .route("/recording/toggle-pause", post(handlers::toggle_pause))
        .route("/recording/switch", post(handlers::switch_source))
        .route("/recording/status", get(handlers::get_status))
        // Stored recordings
        .route("/recordings", get(handlers::list_recordings))
        .route(
            "/recordings/:id",
            get(handlers::download_recording).delete(handlers::delete_recording),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
