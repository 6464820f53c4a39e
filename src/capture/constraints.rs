use serde::{Deserialize, Serialize};

/// Preferred video shape. Values are ideal hints; the platform may substitute
/// the nearest mode it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_frame_rate: u32,
    /// Hard upper bound on frame rate, if any
    #[serde(default)]
    pub max_frame_rate: Option<u32>,
}

impl VideoConstraints {
    pub fn ideal(width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            ideal_width: width,
            ideal_height: height,
            ideal_frame_rate: frame_rate,
            max_frame_rate: None,
        }
    }

    pub fn with_max_frame_rate(mut self, max: u32) -> Self {
        self.max_frame_rate = Some(max);
        self
    }
}

/// Microphone processing flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for MicConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// What kind of display surface to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySurface {
    Screen,
    Tab,
}

/// Display capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConstraints {
    pub surface: DisplaySurface,
    pub video: VideoConstraints,
    /// Whether system/tab audio is requested alongside the video
    pub audio: bool,
}

impl DisplayConstraints {
    /// Same request without audio, used for the fallback retry
    pub fn video_only(&self) -> Self {
        Self {
            audio: false,
            ..*self
        }
    }
}

/// Camera/microphone capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: Option<MicConstraints>,
}

impl UserConstraints {
    pub fn camera(video: VideoConstraints) -> Self {
        Self {
            video: Some(video),
            audio: None,
        }
    }

    pub fn microphone(audio: MicConstraints) -> Self {
        Self {
            video: None,
            audio: Some(audio),
        }
    }
}

/// Capture preferences per source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub screen: VideoConstraints,
    pub tab: VideoConstraints,
    pub camera: VideoConstraints,
    pub microphone: MicConstraints,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screen: VideoConstraints::ideal(1920, 1080, 30).with_max_frame_rate(60),
            tab: VideoConstraints::ideal(1280, 720, 30),
            camera: VideoConstraints::ideal(1280, 720, 30),
            microphone: MicConstraints::default(),
        }
    }
}
