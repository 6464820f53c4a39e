pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod http;
pub mod session;
pub mod sim;
pub mod store;

pub use capture::{
    AcquisitionWarning, AudioMode, CaptureBackend, CaptureConfig, MediaTrack, MediaTrackSet,
    SourceSelector, StreamAcquirer, TrackRole,
};
pub use config::Config;
pub use encoder::{EncoderBackend, EncoderEvent, EncodingFormat, FormatNegotiator};
pub use error::{AcquisitionError, ErrorKind, SessionError, SessionResult};
pub use http::{create_router, AppState};
pub use session::{
    Artifact, ArtifactMeta, RecordingSession, SessionConfig, SessionState, SessionStatus,
};
pub use store::{FileStore, MemoryStore, RecordingStore, StoreConfig};
