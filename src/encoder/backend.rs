use thiserror::Error;
use tokio::sync::mpsc;

use super::bitrate::BitrateHints;
use super::format::EncodingFormat;
use crate::capture::MediaTrackSet;

/// Notification from a running encoder
///
/// For a given encoder, `Stopped` is always delivered after every `Data`
/// event it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// Encoder began producing output
    Started,
    /// Encoded segment
    Data(Vec<u8>),
    /// Flush finished; no more data will follow
    Stopped,
    /// Encoder reported a runtime failure
    Error(String),
}

pub type EncoderEventSender = mpsc::UnboundedSender<EncoderEvent>;
pub type EncoderEventReceiver = mpsc::UnboundedReceiver<EncoderEvent>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    #[error("format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("encoder unavailable: {0}")]
    Unavailable(String),

    #[error("invalid encoder state: {0}")]
    InvalidState(String),
}

/// Platform encoder capability
pub trait EncoderBackend: Send + Sync {
    /// Whether the platform can record into `mime_type`
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create an encoder over `tracks`
    ///
    /// `format: None` asks for the platform default. Events are sent on
    /// `events` for the lifetime of the returned handle.
    fn create(
        &self,
        tracks: &MediaTrackSet,
        format: Option<&EncodingFormat>,
        hints: &BitrateHints,
        events: EncoderEventSender,
    ) -> Result<Box<dyn EncoderHandle>, EncoderError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// A created encoder
pub trait EncoderHandle: Send + Sync {
    /// Container/codec the encoder actually writes; may be empty if unknown
    fn mime_type(&self) -> &str;

    fn start(&mut self) -> Result<(), EncoderError>;

    fn pause(&mut self) -> Result<(), EncoderError>;

    fn resume(&mut self) -> Result<(), EncoderError>;

    /// Request a flush; completion is signalled by `EncoderEvent::Stopped`
    fn stop(&mut self) -> Result<(), EncoderError>;
}
