use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::capture::{
    CaptureBackend, CaptureError, DisplayConstraints, DisplaySurface, MediaTrack, TrackKind,
    UserConstraints,
};

/// Scripted outcomes for the simulated capture backend
#[derive(Debug, Clone, Default)]
pub struct CaptureScript {
    /// Every display request fails with this error
    pub display_error: Option<CaptureError>,
    /// Display requests that include audio fail with this error
    pub display_audio_error: Option<CaptureError>,
    /// Display requests return no video track
    pub display_without_video: bool,
    /// Display requests with audio return the audio track before the video track
    pub audio_first: bool,
    /// Camera requests fail with this error
    pub camera_error: Option<CaptureError>,
    /// Microphone requests fail with this error
    pub mic_error: Option<CaptureError>,
    /// Microphone requests resolve only after this long
    pub mic_delay: Option<Duration>,
}

/// A request the backend received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRequest {
    Display(DisplayConstraints),
    User(UserConstraints),
}

/// Capture backend that fabricates tracks according to a script
pub struct SimulatedCapture {
    script: Mutex<CaptureScript>,
    next_id: AtomicU64,
    requests: Mutex<Vec<CaptureRequest>>,
    live: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl SimulatedCapture {
    pub fn new(script: CaptureScript) -> Self {
        Self {
            script: Mutex::new(script),
            next_id: AtomicU64::new(1),
            requests: Mutex::new(Vec::new()),
            live: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn set_script(&self, script: CaptureScript) {
        *self.script.lock() = script;
    }

    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.requests.lock().clone()
    }

    /// IDs of tracks handed out and not yet released
    pub fn live_tracks(&self) -> Vec<String> {
        self.live.lock().clone()
    }

    /// IDs of released tracks, in release order
    pub fn released_tracks(&self) -> Vec<String> {
        self.released.lock().clone()
    }

    fn track(&self, kind: TrackKind, label: &str) -> MediaTrack {
        let id = format!("track-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.live.lock().push(id.clone());
        MediaTrack::new(id, kind, label)
    }
}

impl Default for SimulatedCapture {
    fn default() -> Self {
        Self::new(CaptureScript::default())
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SimulatedCapture {
    async fn request_display_capture(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<Vec<MediaTrack>, CaptureError> {
        self.requests.lock().push(CaptureRequest::Display(*constraints));
        let script = self.script.lock().clone();

        if let Some(err) = script.display_error {
            return Err(err);
        }
        if constraints.audio {
            if let Some(err) = script.display_audio_error {
                return Err(err);
            }
        }

        let label = match constraints.surface {
            DisplaySurface::Screen => "simulated screen",
            DisplaySurface::Tab => "simulated tab",
        };

        let mut tracks = Vec::new();
        if !script.display_without_video {
            tracks.push(self.track(TrackKind::Video, label));
        }
        if constraints.audio {
            let audio = self.track(TrackKind::Audio, "simulated system audio");
            if script.audio_first {
                tracks.insert(0, audio);
            } else {
                tracks.push(audio);
            }
        }

        Ok(tracks)
    }

    async fn request_user_capture(
        &self,
        constraints: &UserConstraints,
    ) -> Result<Vec<MediaTrack>, CaptureError> {
        self.requests.lock().push(CaptureRequest::User(*constraints));
        let script = self.script.lock().clone();

        if let (Some(delay), Some(_)) = (script.mic_delay, constraints.audio) {
            tokio::time::sleep(delay).await;
        }

        if constraints.video.is_some() {
            if let Some(err) = script.camera_error {
                return Err(err);
            }
        }
        if constraints.audio.is_some() {
            if let Some(err) = script.mic_error {
                return Err(err);
            }
        }

        let mut tracks = Vec::new();
        if constraints.video.is_some() {
            tracks.push(self.track(TrackKind::Video, "simulated camera"));
        }
        if constraints.audio.is_some() {
            tracks.push(self.track(TrackKind::Audio, "simulated microphone"));
        }

        Ok(tracks)
    }

    fn release(&self, track: &MediaTrack) {
        debug!("Simulated release of {}", track.id);
        self.live.lock().retain(|id| id != &track.id);
        self.released.lock().push(track.id.clone());
    }

    fn name(&self) -> &str {
        "simulated capture"
    }
}
