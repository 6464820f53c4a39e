//! Recording session management
//!
//! This module provides the `RecordingSession` state machine that:
//! - Acquires and composes capture tracks
//! - Negotiates the encoding format and drives the encoder
//! - Accumulates encoded chunks and tracks elapsed time
//! - Finalizes and persists an artifact on stop

mod artifact;
mod chunk;
mod clock;
mod config;
mod session;
mod state;
mod stats;

pub use artifact::{format_file_size, Artifact, ArtifactMeta};
pub use chunk::ChunkBuffer;
pub use clock::{format_elapsed, ElapsedClock};
pub use config::SessionConfig;
pub use session::RecordingSession;
pub use state::{SessionAction, SessionState};
pub use stats::SessionStatus;
