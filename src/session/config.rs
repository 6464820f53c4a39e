use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::capture::CaptureConfig;
use crate::encoder::{
    BitrateHints, FormatNegotiator, DEFAULT_FALLBACK_FORMAT, DEFAULT_PREFERRED_FORMATS,
};

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Encoding formats to try, highest preference first
    pub preferred_formats: Vec<String>,

    /// Format used when none of the preferred ones is supported
    pub fallback_format: String,

    /// Requested video bitrate
    /// Default: 5 Mbps
    pub video_bitrate_bps: u64,

    /// Audio bitrate as a fraction of the video bitrate
    /// Default: 0.1
    pub audio_bitrate_ratio: f64,

    /// Requested frame rate
    pub frame_rate: u32,

    /// Idle gap between stop and restart when switching sources
    pub switch_settle_ms: u64,

    /// How long to wait for the encoder to report its flush
    pub flush_timeout_ms: u64,

    /// Period of the elapsed-time display updates
    pub tick_interval_ms: u64,

    /// Capture preferences per source
    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preferred_formats: DEFAULT_PREFERRED_FORMATS.iter().map(|s| s.to_string()).collect(),
            fallback_format: DEFAULT_FALLBACK_FORMAT.to_string(),
            video_bitrate_bps: 5_000_000,
            audio_bitrate_ratio: 0.1,
            frame_rate: 30,
            switch_settle_ms: 1000,
            flush_timeout_ms: 5000,
            tick_interval_ms: 1000,
            capture: CaptureConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn bitrate_hints(&self) -> BitrateHints {
        BitrateHints::from_video_bitrate(
            self.video_bitrate_bps,
            self.audio_bitrate_ratio,
            self.frame_rate,
        )
    }

    pub fn negotiator(&self) -> FormatNegotiator {
        FormatNegotiator::new(self.preferred_formats.clone(), self.fallback_format.clone())
    }

    pub fn switch_settle_delay(&self) -> Duration {
        Duration::from_millis(self.switch_settle_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        // A zero period would make the ticker spin.
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
