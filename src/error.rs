//! Error taxonomy for starting a recording
//!
//! Backend failures (`CaptureError`, `EncoderError`) are translated into an
//! `AcquisitionError` at the session boundary so callers see one user-facing
//! message per failed start.

use serde::Serialize;
use thiserror::Error;

use crate::capture::CaptureError;
use crate::session::SessionState;
use crate::store::StoreError;

/// Why a recording could not be started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("display capture denied: {0}")]
    DisplayCaptureDenied(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("no capture device found: {0}")]
    NoDevice(String),

    #[error("constraints cannot be satisfied: {0}")]
    ConstraintUnsatisfiable(String),

    #[error("acquired stream has no usable video track")]
    EmptyStream,

    #[error("recorder unavailable: {0}")]
    RecorderUnavailable(String),

    #[error("microphone denied: {0}")]
    MicDenied(String),
}

/// Coarse error kind shown to users and API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    PermissionDenied,
    Unsupported,
    NoDevice,
    ConstraintUnsatisfiable,
    EmptyStream,
    RecorderUnavailable,
    MicDenied,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::NoDevice => "NO_DEVICE",
            ErrorKind::ConstraintUnsatisfiable => "CONSTRAINT_UNSATISFIABLE",
            ErrorKind::EmptyStream => "EMPTY_STREAM",
            ErrorKind::RecorderUnavailable => "RECORDER_UNAVAILABLE",
            ErrorKind::MicDenied => "MIC_DENIED",
        }
    }
}

impl AcquisitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquisitionError::DisplayCaptureDenied(_) | AcquisitionError::PermissionDenied(_) => {
                ErrorKind::PermissionDenied
            }
            AcquisitionError::Unsupported(_) => ErrorKind::Unsupported,
            AcquisitionError::NoDevice(_) => ErrorKind::NoDevice,
            AcquisitionError::ConstraintUnsatisfiable(_) => ErrorKind::ConstraintUnsatisfiable,
            AcquisitionError::EmptyStream => ErrorKind::EmptyStream,
            AcquisitionError::RecorderUnavailable(_) => ErrorKind::RecorderUnavailable,
            AcquisitionError::MicDenied(_) => ErrorKind::MicDenied,
        }
    }

    /// Single message suitable for showing to the person recording
    pub fn user_message(&self) -> String {
        let headline = match self.kind() {
            ErrorKind::PermissionDenied => {
                "Permission denied, allow access to the screen, camera and microphone"
            }
            ErrorKind::Unsupported => {
                "This platform does not support the selected recording settings"
            }
            ErrorKind::NoDevice => "No usable camera or microphone was found",
            ErrorKind::ConstraintUnsatisfiable => {
                "The device does not support the selected recording parameters"
            }
            ErrorKind::EmptyStream => "Could not create a valid media stream",
            ErrorKind::RecorderUnavailable => "The recorder could not be started",
            ErrorKind::MicDenied => "Could not access the microphone, check permission settings",
        };

        format!("{}: {}", headline, self)
    }

    /// Translate a failed camera or microphone request
    pub(crate) fn from_capture(err: CaptureError) -> Self {
        match err {
            CaptureError::NotAllowed(msg) => AcquisitionError::PermissionDenied(msg),
            CaptureError::NotSupported(msg) | CaptureError::Other(msg) => {
                AcquisitionError::Unsupported(msg)
            }
            CaptureError::NotFound(msg) => AcquisitionError::NoDevice(msg),
            CaptureError::Overconstrained(msg) => AcquisitionError::ConstraintUnsatisfiable(msg),
        }
    }

    /// Translate a failed screen or tab request
    pub(crate) fn from_display(err: CaptureError) -> Self {
        match err {
            CaptureError::NotAllowed(msg) => AcquisitionError::DisplayCaptureDenied(msg),
            other => Self::from_capture(other),
        }
    }
}

/// Errors returned by `RecordingSession` operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("encoder error: {0}")]
    Encoder(#[from] crate::encoder::EncoderError),

    #[error("failed to persist recording: {0}")]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_denial_maps_to_permission_kind() {
        let denied = CaptureError::NotAllowed("user dismissed picker".into());
        let err = AcquisitionError::from_display(denied);
        assert_eq!(err, AcquisitionError::DisplayCaptureDenied("user dismissed picker".into()));
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_capture_causes_map_to_taxonomy() {
        assert_eq!(
            AcquisitionError::from_capture(CaptureError::NotFound("no camera".into())).kind(),
            ErrorKind::NoDevice
        );
        assert_eq!(
            AcquisitionError::from_capture(CaptureError::Overconstrained("width".into())).kind(),
            ErrorKind::ConstraintUnsatisfiable
        );
        assert_eq!(
            AcquisitionError::from_capture(CaptureError::NotSupported("api".into())).kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_user_message_includes_detail() {
        let msg = AcquisitionError::MicDenied("NotAllowedError".into()).user_message();
        assert!(msg.starts_with("Could not access the microphone"));
        assert!(msg.contains("NotAllowedError"));
    }
}
