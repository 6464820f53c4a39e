// Encoding format negotiation
//
// The preference list is configuration. Negotiation walks it in order and
// takes the first entry the encoder backend accepts; if none is accepted the
// fallback is used anyway, marked unsupported.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::backend::EncoderBackend;

/// Default preference order, highest first
pub const DEFAULT_PREFERRED_FORMATS: [&str; 6] = [
    "video/webm;codecs=vp8,vorbis",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4;codecs=h264",
    "video/mp4",
    "video/mpeg",
];

/// Used when no preferred format is supported, and when the encoder does
/// not report a type of its own
pub const DEFAULT_FALLBACK_FORMAT: &str = "video/webm";

/// A negotiated container/codec choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingFormat {
    mime_type: String,
    supported: bool,
}

impl EncodingFormat {
    pub fn new(mime_type: impl Into<String>, supported: bool) -> Self {
        Self {
            mime_type: mime_type.into(),
            supported,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// `false` means this is the best-effort fallback
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Container part, e.g. `video/webm`
    pub fn container(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Codec list from the `codecs=` parameter, if any
    pub fn codecs(&self) -> Vec<&str> {
        self.mime_type
            .split(';')
            .skip(1)
            .filter_map(|param| param.trim().strip_prefix("codecs="))
            .flat_map(|codecs| codecs.trim_matches('"').split(','))
            .map(str::trim)
            .filter(|codec| !codec.is_empty())
            .collect()
    }

    pub fn file_extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// File extension for a recorded mime type
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.contains("mp4") {
        ".mp4"
    } else if mime_type.contains("mpeg") {
        ".mpeg"
    } else {
        ".webm"
    }
}

/// Picks an encoding format from a ranked preference list
#[derive(Debug, Clone)]
pub struct FormatNegotiator {
    preferences: Vec<String>,
    fallback: String,
}

impl FormatNegotiator {
    pub fn new(preferences: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            preferences,
            fallback: fallback.into(),
        }
    }

    pub fn preferences(&self) -> &[String] {
        &self.preferences
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Negotiate against an arbitrary support probe
    pub fn negotiate_with<F>(&self, is_supported: F) -> EncodingFormat
    where
        F: Fn(&str) -> bool,
    {
        if let Some(mime_type) = self.preferences.iter().find(|m| is_supported(m.as_str())) {
            info!("Using supported format: {}", mime_type);
            return EncodingFormat::new(mime_type.clone(), true);
        }

        warn!(
            "No preferred format is supported, falling back to {}",
            self.fallback
        );
        EncodingFormat::new(self.fallback.clone(), false)
    }

    /// Negotiate against an encoder backend
    pub fn negotiate(&self, encoder: &dyn EncoderBackend) -> EncodingFormat {
        self.negotiate_with(|mime_type| encoder.is_type_supported(mime_type))
    }

    /// Support flag for every preferred format, in preference order
    pub fn support_report(&self, encoder: &dyn EncoderBackend) -> Vec<EncodingFormat> {
        self.preferences
            .iter()
            .map(|mime_type| {
                EncodingFormat::new(mime_type.clone(), encoder.is_type_supported(mime_type))
            })
            .collect()
    }
}

impl Default for FormatNegotiator {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFERRED_FORMATS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_FALLBACK_FORMAT,
        )
    }
}
