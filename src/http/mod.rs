//! HTTP API for controlling the recorder
//!
//! - POST /recording/start - Start recording `{ "source", "audio" }`
//! - POST /recording/stop - Stop and save the recording
//! - POST /recording/pause, /recording/resume, /recording/toggle-pause
//! - POST /recording/switch - Restart with another source
//! - GET /recording/status - Current session status
//! - GET /recordings - Stored recordings, most recent first
//! - GET /recordings/:id - Download a recording
//! - DELETE /recordings/:id - Delete a recording
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, RecordingSummary, StartRecordingRequest};
pub use routes::create_router;
pub use state::AppState;
