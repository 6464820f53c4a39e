use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{CaptureBackend, CaptureError, MediaTrack};
use super::compositor::{compose, MediaTrackSet};
use super::constraints::{CaptureConfig, DisplayConstraints, DisplaySurface, UserConstraints};
use crate::error::AcquisitionError;

/// Which capture backend to invoke for video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    Screen,
    Camera,
    Tab,
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Screen => write!(f, "screen"),
            SourceSelector::Camera => write!(f, "camera"),
            SourceSelector::Tab => write!(f, "tab"),
        }
    }
}

/// Which audio tracks to request and merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AudioMode {
    None,
    #[serde(alias = "system")]
    #[value(alias = "system")]
    SystemOnly,
    #[serde(alias = "mic")]
    #[value(alias = "mic")]
    MicOnly,
    #[default]
    Both,
}

impl AudioMode {
    pub fn wants_system_audio(&self) -> bool {
        matches!(self, AudioMode::SystemOnly | AudioMode::Both)
    }

    pub fn wants_mic(&self) -> bool {
        matches!(self, AudioMode::MicOnly | AudioMode::Both)
    }

    /// Microphone failure is fatal only when it was the only audio asked for
    pub fn requires_mic(&self) -> bool {
        *self == AudioMode::MicOnly
    }
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioMode::None => write!(f, "none"),
            AudioMode::SystemOnly => write!(f, "system-only"),
            AudioMode::MicOnly => write!(f, "mic-only"),
            AudioMode::Both => write!(f, "both"),
        }
    }
}

/// Non-fatal problem hit while acquiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cause", rename_all = "kebab-case")]
pub enum AcquisitionWarning {
    /// Display audio was refused; recording continues with video only
    DisplayAudioUnavailable(String),
    /// Microphone was refused; recording continues without it
    MicUnavailable(String),
}

/// Result of a successful acquisition
#[derive(Debug, Clone)]
pub struct AcquiredStream {
    pub tracks: MediaTrackSet,
    pub warnings: Vec<AcquisitionWarning>,
}

/// Requests tracks from the capture backend and applies the fallback rules
pub struct StreamAcquirer {
    backend: Arc<dyn CaptureBackend>,
    config: CaptureConfig,
}

impl StreamAcquirer {
    pub fn new(backend: Arc<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Acquire a composed track set for `source` with the requested audio
    ///
    /// On error every track acquired during this call has been released.
    /// The same holds when the returned future is dropped before it
    /// resolves.
    pub async fn acquire(
        &self,
        source: SourceSelector,
        audio_mode: AudioMode,
    ) -> Result<AcquiredStream, AcquisitionError> {
        info!(
            "Acquiring {} capture (audio: {}) from {}",
            source,
            audio_mode,
            self.backend.name()
        );

        let mut warnings = Vec::new();
        let mut pending = PendingTracks::new(self);

        let primary = match source {
            SourceSelector::Screen => {
                self.acquire_display(DisplaySurface::Screen, audio_mode, &mut warnings)
                    .await?
            }
            SourceSelector::Tab => {
                self.acquire_display(DisplaySurface::Tab, audio_mode, &mut warnings)
                    .await?
            }
            SourceSelector::Camera => {
                let constraints = UserConstraints::camera(self.config.camera);
                self.backend
                    .request_user_capture(&constraints)
                    .await
                    .map_err(AcquisitionError::from_capture)?
            }
        };
        pending.hold(&primary);

        let mut unused = Vec::new();
        let (mut video, mut primary_audio): (Vec<_>, Vec<_>) =
            primary.into_iter().partition(MediaTrack::is_video);

        if video.len() > 1 {
            unused.extend(video.split_off(1));
        }

        // Only one system track is kept; the rest of the primary audio is not ours.
        let mut system_audio = Vec::new();
        if audio_mode.wants_system_audio() && !primary_audio.is_empty() {
            system_audio.push(primary_audio.remove(0));
        }
        unused.extend(primary_audio);

        if video.is_empty() {
            warn!("{} capture returned no video track", source);
            return Err(AcquisitionError::EmptyStream);
        }

        if audio_mode.wants_system_audio() && system_audio.is_empty() {
            debug!("No system audio track available for {} capture", source);
        }

        let mut mic_audio = Vec::new();
        if audio_mode.wants_mic() {
            match self.acquire_mic().await {
                Ok(mut tracks) => {
                    pending.hold(&tracks);
                    mic_audio.push(tracks.remove(0));
                    unused.extend(tracks);
                }
                Err(err) if audio_mode.requires_mic() => {
                    warn!("Microphone required but unavailable: {}", err);
                    return Err(AcquisitionError::MicDenied(err.to_string()));
                }
                Err(err) => {
                    warn!("Microphone unavailable, continuing without it: {}", err);
                    warnings.push(AcquisitionWarning::MicUnavailable(err.to_string()));
                }
            }
        }

        let tracks = compose(video, system_audio, mic_audio);
        if tracks.is_empty() {
            return Err(AcquisitionError::EmptyStream);
        }

        pending.commit();
        self.release_all(&unused);

        info!(
            "Acquired {} tracks ({} audio) for {} capture",
            tracks.len(),
            tracks.audio_count(),
            source
        );

        Ok(AcquiredStream { tracks, warnings })
    }

    /// Stop every track in a composed set
    pub fn release(&self, tracks: &MediaTrackSet) {
        for track in tracks.iter() {
            self.release_track(track);
        }
    }

    async fn acquire_display(
        &self,
        surface: DisplaySurface,
        audio_mode: AudioMode,
        warnings: &mut Vec<AcquisitionWarning>,
    ) -> Result<Vec<MediaTrack>, AcquisitionError> {
        let video = match surface {
            DisplaySurface::Screen => self.config.screen,
            DisplaySurface::Tab => self.config.tab,
        };

        let constraints = DisplayConstraints {
            surface,
            video,
            audio: audio_mode.wants_system_audio(),
        };

        match self.backend.request_display_capture(&constraints).await {
            Ok(tracks) => Ok(tracks),
            Err(err) if constraints.audio => {
                warn!("Display capture with audio failed, retrying video-only: {}", err);

                let tracks = self
                    .backend
                    .request_display_capture(&constraints.video_only())
                    .await
                    .map_err(AcquisitionError::from_display)?;

                warnings.push(AcquisitionWarning::DisplayAudioUnavailable(err.to_string()));
                Ok(tracks)
            }
            Err(err) => Err(AcquisitionError::from_display(err)),
        }
    }

    async fn acquire_mic(&self) -> Result<Vec<MediaTrack>, CaptureError> {
        let constraints = UserConstraints::microphone(self.config.microphone);
        let tracks = self.backend.request_user_capture(&constraints).await?;

        let (audio, other): (Vec<_>, Vec<_>) = tracks.into_iter().partition(MediaTrack::is_audio);
        self.release_all(&other);

        if audio.is_empty() {
            return Err(CaptureError::NotFound(
                "microphone request returned no audio track".to_string(),
            ));
        }

        Ok(audio)
    }

    fn release_all(&self, tracks: &[MediaTrack]) {
        for track in tracks {
            self.release_track(track);
        }
    }

    fn release_track(&self, track: &MediaTrack) {
        debug!("Releasing track {} ({:?}, {})", track.id, track.kind, track.label);
        self.backend.release(track);
    }
}

/// Tracks handed out during one `acquire` call
///
/// Released on drop unless committed, which covers early returns and a
/// dropped acquisition future alike.
struct PendingTracks<'a> {
    acquirer: &'a StreamAcquirer,
    tracks: Vec<MediaTrack>,
}

impl<'a> PendingTracks<'a> {
    fn new(acquirer: &'a StreamAcquirer) -> Self {
        Self {
            acquirer,
            tracks: Vec::new(),
        }
    }

    fn hold(&mut self, tracks: &[MediaTrack]) {
        self.tracks.extend_from_slice(tracks);
    }

    /// Ownership passes to the caller
    fn commit(&mut self) {
        self.tracks.clear();
    }
}

impl Drop for PendingTracks<'_> {
    fn drop(&mut self) {
        if !self.tracks.is_empty() {
            warn!("Acquisition abandoned, releasing {} tracks", self.tracks.len());
            self.acquirer.release_all(&self.tracks);
        }
    }
}
