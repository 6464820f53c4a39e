//! Capture side of the recorder
//!
//! - `backend`: the platform capture trait and track types
//! - `constraints`: request shapes and per-source preferences
//! - `acquirer`: source/audio-mode selection with fallback retries
//! - `compositor`: deterministic merging of acquired tracks

pub mod acquirer;
pub mod backend;
pub mod compositor;
pub mod constraints;

pub use acquirer::{AcquiredStream, AcquisitionWarning, AudioMode, SourceSelector, StreamAcquirer};
pub use backend::{CaptureBackend, CaptureError, MediaTrack, TrackKind};
pub use compositor::{compose, MediaTrackSet, TrackEntry, TrackRole};
pub use constraints::{
    CaptureConfig, DisplayConstraints, DisplaySurface, MicConstraints, UserConstraints,
    VideoConstraints,
};
