pub mod backend;
pub mod bitrate;
pub mod format;

pub use backend::{
    EncoderBackend, EncoderError, EncoderEvent, EncoderEventReceiver, EncoderEventSender,
    EncoderHandle,
};
pub use bitrate::BitrateHints;
pub use format::{
    extension_for_mime, EncodingFormat, FormatNegotiator, DEFAULT_FALLBACK_FORMAT,
    DEFAULT_PREFERRED_FORMATS,
};
