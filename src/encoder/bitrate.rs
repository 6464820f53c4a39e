use serde::{Deserialize, Serialize};

/// Target bitrates passed to the encoder; hints, not guarantees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateHints {
    pub video_bits_per_second: u64,
    pub audio_bits_per_second: u64,
    pub frame_rate: u32,
}

impl BitrateHints {
    /// Derive the audio bitrate as a fraction of the video bitrate
    pub fn from_video_bitrate(
        video_bits_per_second: u64,
        audio_ratio: f64,
        frame_rate: u32,
    ) -> Self {
        let ratio = if audio_ratio.is_finite() {
            audio_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            video_bits_per_second,
            audio_bits_per_second: (video_bits_per_second as f64 * ratio).round() as u64,
            frame_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_is_fraction_of_video() {
        let hints = BitrateHints::from_video_bitrate(5_000_000, 0.1, 30);
        assert_eq!(hints.audio_bits_per_second, 500_000);
        assert_eq!(hints.video_bits_per_second, 5_000_000);
        assert_eq!(hints.frame_rate, 30);
    }

    #[test]
    fn test_ratio_is_clamped() {
        assert_eq!(BitrateHints::from_video_bitrate(1000, 2.0, 30).audio_bits_per_second, 1000);
        assert_eq!(BitrateHints::from_video_bitrate(1000, -1.0, 30).audio_bits_per_second, 0);
        assert_eq!(BitrateHints::from_video_bitrate(1000, f64::NAN, 30).audio_bits_per_second, 0);
    }
}
