use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constraints::{DisplayConstraints, UserConstraints};

/// Media type carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// A single live audio or video track handed out by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    /// Platform track identifier, used to release the track
    pub id: String,
    /// Video or audio
    pub kind: TrackKind,
    /// Human-readable label (device or surface name)
    pub label: String,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == TrackKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == TrackKind::Audio
    }
}

/// Failure reported by the platform for a capture request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("not allowed: {0}")]
    NotAllowed(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("overconstrained: {0}")]
    Overconstrained(String),

    #[error("capture failed: {0}")]
    Other(String),
}

/// Capture backend trait
///
/// Implementations wrap whatever the host platform offers for display and
/// camera/microphone capture. Requests may suspend until the user answers a
/// permission prompt.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request a screen or tab capture
    async fn request_display_capture(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<Vec<MediaTrack>, CaptureError>;

    /// Request camera and/or microphone capture
    async fn request_user_capture(
        &self,
        constraints: &UserConstraints,
    ) -> Result<Vec<MediaTrack>, CaptureError>;

    /// Stop a track previously returned by one of the request methods
    fn release(&self, track: &MediaTrack);

    /// Get backend name for logging
    fn name(&self) -> &str;
}
