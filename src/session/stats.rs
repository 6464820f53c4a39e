use serde::Serialize;

use super::state::SessionState;
use crate::capture::{AcquisitionWarning, AudioMode, SourceSelector, TrackRole};
use crate::encoder::EncodingFormat;

/// Snapshot of a recording session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    /// Current state
    pub state: SessionState,

    /// Source being captured, if any
    pub source: Option<SourceSelector>,

    /// Audio mode requested for the current recording
    pub audio_mode: Option<AudioMode>,

    /// Negotiated encoding format
    pub format: Option<EncodingFormat>,

    /// Roles of the tracks feeding the encoder, in order
    pub tracks: Vec<TrackRole>,

    /// Active recording time in milliseconds
    pub elapsed_ms: u64,

    /// Active recording time as `HH:MM:SS`
    pub elapsed: String,

    /// Number of encoded chunks buffered so far
    pub chunks_count: usize,

    /// Total buffered bytes
    pub buffered_bytes: usize,

    /// Non-fatal problems from acquisition
    pub warnings: Vec<AcquisitionWarning>,

    /// Last runtime error reported by the encoder
    pub last_error: Option<String>,
}
