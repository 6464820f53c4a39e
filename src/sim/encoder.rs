use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::capture::MediaTrackSet;
use crate::encoder::{
    BitrateHints, EncoderBackend, EncoderError, EncoderEvent, EncoderEventSender, EncoderHandle,
    EncodingFormat, DEFAULT_FALLBACK_FORMAT,
};

/// Scripted behaviour for the simulated encoder
#[derive(Debug, Clone)]
pub struct EncoderScript {
    /// Mime types reported as supported
    pub supported: Vec<String>,
    /// Reject every explicitly requested format (platform default still works)
    pub reject_requested_format: bool,
    /// Reject every create call
    pub unavailable: bool,
    /// Fail when the created encoder is started
    pub fail_on_start: bool,
    /// Type written when created with the platform default
    pub default_mime_type: String,
    /// Segment emitted as part of the flush on stop
    pub final_chunk: Option<Vec<u8>>,
    /// Emit a synthetic segment at this period while recording
    pub timeslice: Option<Duration>,
    /// Size of each synthetic segment
    pub chunk_size: usize,
    /// Send `Stopped` after the flush; when false the flush never completes
    pub report_stop: bool,
}

impl Default for EncoderScript {
    fn default() -> Self {
        Self {
            supported: vec![
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            reject_requested_format: false,
            unavailable: false,
            fail_on_start: false,
            default_mime_type: DEFAULT_FALLBACK_FORMAT.to_string(),
            final_chunk: None,
            timeslice: None,
            chunk_size: 1024,
            report_stop: true,
        }
    }
}

/// Shared between the handle, its ticker and the backend
struct Recorder {
    sender: Mutex<Option<EncoderEventSender>>,
    paused: AtomicBool,
}

impl Recorder {
    fn send(&self, event: EncoderEvent) -> bool {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

/// Encoder backend that produces synthetic output according to a script
pub struct SimulatedEncoder {
    script: Mutex<EncoderScript>,
    current: Mutex<Option<Arc<Recorder>>>,
    requested: Mutex<Vec<Option<String>>>,
    hints: Mutex<Vec<BitrateHints>>,
}

impl SimulatedEncoder {
    pub fn new(script: EncoderScript) -> Self {
        Self {
            script: Mutex::new(script),
            current: Mutex::new(None),
            requested: Mutex::new(Vec::new()),
            hints: Mutex::new(Vec::new()),
        }
    }

    pub fn set_script(&self, script: EncoderScript) {
        *self.script.lock() = script;
    }

    /// Deliver a data segment through the most recently created encoder
    ///
    /// Returns false when that encoder has already flushed.
    pub fn emit(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.send(EncoderEvent::Data(bytes.into()))
    }

    /// Report a runtime error through the most recently created encoder
    pub fn emit_error(&self, cause: impl Into<String>) -> bool {
        self.send(EncoderEvent::Error(cause.into()))
    }

    /// Formats passed to `create`, `None` for platform default requests
    pub fn requested_formats(&self) -> Vec<Option<String>> {
        self.requested.lock().clone()
    }

    pub fn last_hints(&self) -> Option<BitrateHints> {
        self.hints.lock().last().copied()
    }

    fn send(&self, event: EncoderEvent) -> bool {
        match self.current.lock().as_ref() {
            Some(recorder) => recorder.send(event),
            None => false,
        }
    }
}

impl Default for SimulatedEncoder {
    fn default() -> Self {
        Self::new(EncoderScript::default())
    }
}

impl EncoderBackend for SimulatedEncoder {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.script.lock().supported.iter().any(|m| m == mime_type)
    }

    fn create(
        &self,
        _tracks: &MediaTrackSet,
        format: Option<&EncodingFormat>,
        hints: &BitrateHints,
        events: EncoderEventSender,
    ) -> Result<Box<dyn EncoderHandle>, EncoderError> {
        let script = self.script.lock().clone();
        self.requested
            .lock()
            .push(format.map(|f| f.mime_type().to_string()));
        self.hints.lock().push(*hints);

        if script.unavailable {
            return Err(EncoderError::Unavailable("simulated encoder disabled".to_string()));
        }

        let mime_type = match format {
            Some(format) => {
                let known = script.supported.iter().any(|m| m == format.mime_type());
                if script.reject_requested_format || !known {
                    return Err(EncoderError::UnsupportedFormat(format.mime_type().to_string()));
                }
                format.mime_type().to_string()
            }
            None => script.default_mime_type.clone(),
        };

        debug!("Simulated encoder created for {}", mime_type);

        let recorder = Arc::new(Recorder {
            sender: Mutex::new(Some(events)),
            paused: AtomicBool::new(false),
        });
        *self.current.lock() = Some(Arc::clone(&recorder));

        Ok(Box::new(SimulatedHandle {
            recorder,
            mime_type,
            phase: Phase::Inactive,
            ticker: None,
            script,
        }))
    }

    fn name(&self) -> &str {
        "simulated encoder"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Inactive,
    Recording,
    Paused,
    Stopped,
}

struct SimulatedHandle {
    recorder: Arc<Recorder>,
    mime_type: String,
    phase: Phase,
    ticker: Option<JoinHandle<()>>,
    script: EncoderScript,
}

impl SimulatedHandle {
    fn expect_phase(&self, expected: &[Phase], action: &str) -> Result<(), EncoderError> {
        if expected.contains(&self.phase) {
            Ok(())
        } else {
            Err(EncoderError::InvalidState(format!(
                "cannot {} while {:?}",
                action, self.phase
            )))
        }
    }
}

impl EncoderHandle for SimulatedHandle {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self) -> Result<(), EncoderError> {
        self.expect_phase(&[Phase::Inactive], "start")?;
        if self.script.fail_on_start {
            return Err(EncoderError::Unavailable("simulated start failure".to_string()));
        }

        self.recorder.send(EncoderEvent::Started);
        self.phase = Phase::Recording;

        if let Some(slice) = self.script.timeslice {
            let recorder = Arc::clone(&self.recorder);
            let size = self.script.chunk_size.max(1);

            self.ticker = Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval(slice);
                interval.tick().await;
                let mut seq: u8 = 0;

                loop {
                    interval.tick().await;
                    if recorder.paused.load(Ordering::SeqCst) {
                        continue;
                    }
                    seq = seq.wrapping_add(1);
                    if !recorder.send(EncoderEvent::Data(vec![seq; size])) {
                        break;
                    }
                }
            }));
        }

        Ok(())
    }

    fn pause(&mut self) -> Result<(), EncoderError> {
        self.expect_phase(&[Phase::Recording], "pause")?;
        self.recorder.paused.store(true, Ordering::SeqCst);
        self.phase = Phase::Paused;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EncoderError> {
        self.expect_phase(&[Phase::Paused], "resume")?;
        self.recorder.paused.store(false, Ordering::SeqCst);
        self.phase = Phase::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EncoderError> {
        self.expect_phase(&[Phase::Recording, Phase::Paused], "stop")?;

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        // Flush under the sender lock so no ticker output can follow `Stopped`.
        {
            let mut sender = self.recorder.sender.lock();
            if let Some(tx) = sender.as_ref() {
                if let Some(chunk) = self.script.final_chunk.take() {
                    let _ = tx.send(EncoderEvent::Data(chunk));
                }
                if self.script.report_stop {
                    let _ = tx.send(EncoderEvent::Stopped);
                }
            }
            if self.script.report_stop {
                sender.take();
            }
        }

        self.phase = Phase::Stopped;
        Ok(())
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
