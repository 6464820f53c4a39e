use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::artifact::Artifact;
use super::chunk::ChunkBuffer;
use super::clock::{format_elapsed, ElapsedClock};
use super::config::SessionConfig;
use super::state::{SessionAction, SessionState};
use super::stats::SessionStatus;
use crate::capture::{
    AcquisitionWarning, AudioMode, CaptureBackend, MediaTrackSet, SourceSelector, StreamAcquirer,
};
use crate::encoder::{
    EncoderBackend, EncoderEvent, EncoderEventReceiver, EncoderEventSender, EncoderHandle,
    EncodingFormat, FormatNegotiator,
};
use crate::error::{AcquisitionError, SessionError, SessionResult};
use crate::store::RecordingStore;

/// Everything that exists only between a successful start and finalization
struct ActiveRecording {
    source: SourceSelector,
    audio_mode: AudioMode,
    tracks: MediaTrackSet,
    format: EncodingFormat,
    encoder: Box<dyn EncoderHandle>,
    events: EncoderEventReceiver,
    warnings: Vec<AcquisitionWarning>,
    /// No further events are expected: the encoder reported `Stopped`, or
    /// refused the stop request
    encoder_stopped: bool,
}

/// A recording session: one recorder, one recording at a time
///
/// The session owns the chunk buffer and the encoder event stream. All
/// transitions take `&mut self`, so a second `start` cannot race a pending
/// acquisition; callers sharing a session behind a lock get queued
/// semantics for free.
///
/// `start` and `stop` may be dropped at any await point. A dropped start
/// leaves the session in Acquiring with its tracks already released; the
/// next call puts it back in Idle. A dropped stop leaves it in Stopping
/// with the recording intact; the next `stop` or `start` finishes the
/// flush and finalizes.
pub struct RecordingSession {
    config: SessionConfig,
    acquirer: StreamAcquirer,
    encoder_backend: Arc<dyn EncoderBackend>,
    negotiator: FormatNegotiator,
    store: Arc<dyn RecordingStore>,
    state: SessionState,
    active: Option<ActiveRecording>,
    chunks: ChunkBuffer,
    clock: ElapsedClock,
    last_error: Option<String>,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        capture: Arc<dyn CaptureBackend>,
        encoder: Arc<dyn EncoderBackend>,
        store: Arc<dyn RecordingStore>,
    ) -> Self {
        info!(
            "Creating recording session (capture: {}, encoder: {})",
            capture.name(),
            encoder.name()
        );

        let acquirer = StreamAcquirer::new(capture, config.capture.clone());
        let negotiator = config.negotiator();

        Self {
            config,
            acquirer,
            encoder_backend: encoder,
            negotiator,
            store,
            state: SessionState::Idle,
            active: None,
            chunks: ChunkBuffer::new(),
            clock: ElapsedClock::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordingStore> {
        &self.store
    }

    /// Start recording `source` with the requested audio
    ///
    /// On failure the session is back in Idle with every acquired track
    /// released.
    pub async fn start(
        &mut self,
        source: SourceSelector,
        audio_mode: AudioMode,
    ) -> SessionResult<()> {
        self.reclaim_abandoned_start();
        if self.state == SessionState::Stopping {
            warn!("Finishing an interrupted stop before starting");
            self.finish_stop().await?;
        }

        self.advance(SessionAction::Start)?;
        info!("Starting recording: {} (audio: {})", source, audio_mode);

        let acquired = match self.acquirer.acquire(source, audio_mode).await {
            Ok(acquired) => acquired,
            Err(err) => return Err(self.fail_start(err)),
        };

        let format = self.negotiator.negotiate(self.encoder_backend.as_ref());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut encoder = match self.create_encoder(&acquired.tracks, &format, events_tx) {
            Ok(encoder) => encoder,
            Err(err) => {
                self.acquirer.release(&acquired.tracks);
                return Err(self.fail_start(err));
            }
        };

        if let Err(err) = encoder.start() {
            self.acquirer.release(&acquired.tracks);
            return Err(self.fail_start(AcquisitionError::RecorderUnavailable(err.to_string())));
        }

        self.chunks.clear();
        self.last_error = None;
        self.clock.start(self.config.tick_interval());

        self.active = Some(ActiveRecording {
            source,
            audio_mode,
            tracks: acquired.tracks,
            format,
            encoder,
            events: events_rx,
            warnings: acquired.warnings,
            encoder_stopped: false,
        });
        self.advance(SessionAction::AcquisitionSucceeded)?;

        info!("Recording started");
        Ok(())
    }

    /// Suspend the encoder and freeze the clock
    pub fn pause(&mut self) -> SessionResult<()> {
        self.reclaim_abandoned_start();
        self.ensure_allowed(SessionAction::Pause)?;

        // Data produced before the pause still belongs to the recording.
        self.process_pending();

        if let Some(active) = self.active.as_mut() {
            active.encoder.pause()?;
        }
        self.clock.pause();
        self.advance(SessionAction::Pause)?;

        info!("Recording paused at {}", format_elapsed(self.clock.elapsed()));
        Ok(())
    }

    /// Resume the encoder and the clock
    pub fn resume(&mut self) -> SessionResult<()> {
        self.reclaim_abandoned_start();
        self.ensure_allowed(SessionAction::Resume)?;

        // Anything that arrived while paused is discarded here.
        self.process_pending();

        if let Some(active) = self.active.as_mut() {
            active.encoder.resume()?;
        }
        self.clock.resume();
        self.advance(SessionAction::Resume)?;

        info!("Recording resumed");
        Ok(())
    }

    /// Pause when recording, resume when paused
    pub fn toggle_pause(&mut self) -> SessionResult<SessionState> {
        self.reclaim_abandoned_start();
        match self.state {
            SessionState::Recording => self.pause()?,
            SessionState::Paused => self.resume()?,
            state => {
                return Err(SessionError::InvalidTransition {
                    action: "toggle pause",
                    state,
                })
            }
        }
        Ok(self.state)
    }

    /// Stop, wait for the encoder flush and finalize
    ///
    /// Returns the persisted artifact, or `None` when nothing was recorded.
    /// Called again after an interrupted stop, it resumes waiting for the
    /// flush.
    pub async fn stop(&mut self) -> SessionResult<Option<Artifact>> {
        self.reclaim_abandoned_start();

        if self.state == SessionState::Stopping {
            info!("Resuming interrupted stop");
        } else {
            self.ensure_allowed(SessionAction::Stop)?;

            self.process_pending();
            self.advance(SessionAction::Stop)?;
            info!("Stopping recording");

            self.request_flush();
        }

        self.finish_stop().await
    }

    /// Stop, wait the settle delay, then start again with a new source
    ///
    /// There is an Idle gap between the two recordings in which nothing is
    /// captured. Returns the artifact of the recording that was stopped.
    pub async fn switch_source(
        &mut self,
        source: SourceSelector,
        audio_mode: AudioMode,
    ) -> SessionResult<Option<Artifact>> {
        self.reclaim_abandoned_start();
        if !self.state.is_capturing() {
            return Err(SessionError::InvalidTransition {
                action: "switch source",
                state: self.state,
            });
        }

        info!("Switching source to {} (audio: {})", source, audio_mode);

        let artifact = self.stop().await?;
        tokio::time::sleep(self.config.switch_settle_delay()).await;
        self.start(source, audio_mode).await?;

        Ok(artifact)
    }

    /// Feed one encoder event into the state machine
    ///
    /// Data is kept only while the session accepts chunks; anything else
    /// (late callbacks after finalization, output while paused) is dropped.
    ///
    /// Events wait in the channel until drained, and a chunk is judged by
    /// the state at drain time, not at delivery. Every transition that
    /// changes `accepts_chunks` must therefore call `process_pending`
    /// before changing state: pause and stop drain so earlier output is
    /// kept, resume drains so output from the paused span is dropped.
    pub fn handle_event(&mut self, event: EncoderEvent) {
        match event {
            EncoderEvent::Data(bytes) => {
                if !self.state.accepts_chunks() {
                    debug!(
                        "Discarding {} byte chunk delivered while {}",
                        bytes.len(),
                        self.state
                    );
                    return;
                }
                self.chunks.push(bytes);
            }
            EncoderEvent::Started => {
                debug!("Encoder started");
            }
            EncoderEvent::Stopped => {
                if let Some(active) = self.active.as_mut() {
                    if self.state.is_capturing() {
                        warn!("Encoder stopped on its own while {}", self.state);
                    }
                    active.encoder_stopped = true;
                }
            }
            EncoderEvent::Error(cause) => {
                error!("Encoder error: {}", cause);
                self.last_error = Some(cause);
            }
        }
    }

    /// Drain encoder events that arrived since the last call
    ///
    /// See `handle_event` for which state the drained data is judged by.
    pub fn process_pending(&mut self) {
        self.reclaim_abandoned_start();
        let mut pending = Vec::new();
        if let Some(active) = self.active.as_mut() {
            while let Ok(event) = active.events.try_recv() {
                pending.push(event);
            }
        }

        for event in pending {
            self.handle_event(event);
        }
    }

    pub fn status(&self) -> SessionStatus {
        let elapsed = self.clock.elapsed();
        let active = self.active.as_ref();

        SessionStatus {
            state: self.state,
            source: active.map(|a| a.source),
            audio_mode: active.map(|a| a.audio_mode),
            format: active.map(|a| a.format.clone()),
            tracks: active.map(|a| a.tracks.roles()).unwrap_or_default(),
            elapsed_ms: elapsed.as_millis() as u64,
            elapsed: format_elapsed(elapsed),
            chunks_count: self.chunks.len(),
            buffered_bytes: self.chunks.byte_len(),
            warnings: active.map(|a| a.warnings.clone()).unwrap_or_default(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn buffered_chunks(&self) -> &[Vec<u8>] {
        self.chunks.chunks()
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Whether the elapsed-time ticker is running
    pub fn clock_running(&self) -> bool {
        self.clock.is_ticking()
    }

    /// Periodic elapsed-time updates for display
    pub fn elapsed_updates(&self) -> watch::Receiver<Duration> {
        self.clock.subscribe()
    }

    pub fn tracks(&self) -> Option<&MediaTrackSet> {
        self.active.as_ref().map(|a| &a.tracks)
    }

    pub fn negotiated_format(&self) -> Option<&EncodingFormat> {
        self.active.as_ref().map(|a| &a.format)
    }

    pub fn warnings(&self) -> &[AcquisitionWarning] {
        self.active.as_ref().map(|a| a.warnings.as_slice()).unwrap_or(&[])
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn create_encoder(
        &self,
        tracks: &MediaTrackSet,
        format: &EncodingFormat,
        events: EncoderEventSender,
    ) -> Result<Box<dyn EncoderHandle>, AcquisitionError> {
        let hints = self.config.bitrate_hints();

        match self
            .encoder_backend
            .create(tracks, Some(format), &hints, events.clone())
        {
            Ok(encoder) => Ok(encoder),
            Err(err) => {
                warn!(
                    "Creating encoder with {} failed, trying platform default: {}",
                    format.mime_type(),
                    err
                );
                self.encoder_backend
                    .create(tracks, None, &hints, events)
                    .map_err(|err| AcquisitionError::RecorderUnavailable(err.to_string()))
            }
        }
    }

    /// Freeze the clock and ask the encoder to flush
    fn request_flush(&mut self) {
        self.clock.stop();

        let Some(active) = self.active.as_mut() else {
            return;
        };

        if active.encoder_stopped {
            debug!("Encoder already stopped, skipping flush");
        } else if let Err(err) = active.encoder.stop() {
            warn!("Encoder refused to stop cleanly: {}", err);
            active.encoder_stopped = true;
        }
    }

    /// Wait for the flush (bounded by the flush timeout), then finalize
    ///
    /// The recording stays in `self.active` until the flush resolves, so
    /// dropping this future loses nothing.
    async fn finish_stop(&mut self) -> SessionResult<Option<Artifact>> {
        let awaiting = self
            .active
            .as_ref()
            .is_some_and(|active| !active.encoder_stopped);

        if awaiting {
            self.await_flush().await;
        }

        let Some(active) = self.active.take() else {
            // Unreachable through the public API; finalize whatever is there.
            warn!("Stopping without an active encoder");
            let duration = self.clock.elapsed();
            return self.finalize(None, duration);
        };

        let duration = self.clock.elapsed();
        self.finalize(Some(active), duration)
    }

    async fn await_flush(&mut self) {
        let timeout = self.config.flush_timeout();
        let flush = async {
            loop {
                let event = match self.active.as_mut() {
                    Some(active) => active.events.recv().await,
                    None => None,
                };
                let Some(event) = event else {
                    return false;
                };

                let done = event == EncoderEvent::Stopped;
                self.handle_event(event);
                if done {
                    return true;
                }
            }
        };

        match tokio::time::timeout(timeout, flush).await {
            Ok(true) => debug!("Encoder flush complete"),
            Ok(false) => warn!("Encoder event stream closed before flush completed"),
            Err(_) => warn!(
                "Encoder flush timed out after {:?}, finalizing buffered data",
                timeout
            ),
        }
    }

    /// Leave Stopping: release resources, hand off the buffer, persist
    fn finalize(
        &mut self,
        active: Option<ActiveRecording>,
        duration: Duration,
    ) -> SessionResult<Option<Artifact>> {
        let bytes = self.chunks.take_bytes();

        let mime_type = match &active {
            Some(active) if !active.encoder.mime_type().is_empty() => {
                active.encoder.mime_type().to_string()
            }
            _ => self.negotiator.fallback().to_string(),
        };

        if let Some(active) = active {
            self.acquirer.release(&active.tracks);
        }
        self.advance(SessionAction::FlushComplete)?;

        if bytes.is_empty() {
            info!("Recording stopped with no data, nothing to save");
            return Ok(None);
        }

        let artifact = Artifact::new(bytes, &mime_type, duration);
        let evicted = self.store.save(&artifact)?;
        for old in &evicted {
            info!("Evicted old recording {} ({})", old.filename, old.id);
        }

        info!(
            "Recording saved: {} ({} bytes, {})",
            artifact.filename(),
            artifact.size(),
            format_elapsed(duration)
        );

        Ok(Some(artifact))
    }

    /// A session found in Acquiring outside `start` belongs to a start
    /// whose future was dropped; its tracks were released with it.
    fn reclaim_abandoned_start(&mut self) {
        if self.state == SessionState::Acquiring {
            warn!("Previous start was abandoned during acquisition, returning to idle");
            self.state = SessionState::Acquiring
                .next(SessionAction::AcquisitionFailed)
                .unwrap_or(SessionState::Idle);
        }
    }

    fn fail_start(&mut self, err: AcquisitionError) -> SessionError {
        error!("Failed to start recording: {}", err);
        self.state = SessionState::Acquiring
            .next(SessionAction::AcquisitionFailed)
            .unwrap_or(SessionState::Idle);
        SessionError::Acquisition(err)
    }

    fn ensure_allowed(&self, action: SessionAction) -> SessionResult<SessionState> {
        self.state
            .next(action)
            .ok_or(SessionError::InvalidTransition {
                action: action.name(),
                state: self.state,
            })
    }

    fn advance(&mut self, action: SessionAction) -> SessionResult<()> {
        let next = self.ensure_allowed(action)?;
        debug!("Session {} -> {} ({})", self.state, next, action.name());
        self.state = next;
        Ok(())
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!("Recording session dropped while {}, releasing tracks", self.state);
            self.acquirer.release(&active.tracks);
        }
    }
}
