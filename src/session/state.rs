//! Recording state machine
//!
//! Every transition the session may take is listed in `SessionState::next`.
//! Anything not listed is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of the recording session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No recording in progress
    #[default]
    Idle,
    /// Waiting for capture permissions/devices
    Acquiring,
    /// Encoder running
    Recording,
    /// Encoder suspended, clock frozen
    Paused,
    /// Encoder flushing
    Stopping,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    AcquisitionSucceeded,
    AcquisitionFailed,
    Pause,
    Resume,
    Stop,
    FlushComplete,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::Start => "start",
            SessionAction::AcquisitionSucceeded => "complete acquisition",
            SessionAction::AcquisitionFailed => "fail acquisition",
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::Stop => "stop",
            SessionAction::FlushComplete => "finish flushing",
        }
    }
}

impl SessionState {
    /// Transition table; `None` means the action is not allowed here
    pub fn next(self, action: SessionAction) -> Option<SessionState> {
        use SessionAction as A;
        use SessionState as S;

        match (self, action) {
            (S::Idle, A::Start) => Some(S::Acquiring),
            (S::Acquiring, A::AcquisitionSucceeded) => Some(S::Recording),
            (S::Acquiring, A::AcquisitionFailed) => Some(S::Idle),
            (S::Recording, A::Pause) => Some(S::Paused),
            (S::Paused, A::Resume) => Some(S::Recording),
            (S::Recording | S::Paused, A::Stop) => Some(S::Stopping),
            (S::Stopping, A::FlushComplete) => Some(S::Idle),
            _ => None,
        }
    }

    /// Whether encoded data is appended to the chunk buffer in this state
    ///
    /// Paused is excluded: pending data is drained before pausing, so
    /// anything arriving while paused is stray output.
    pub fn accepts_chunks(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Stopping)
    }

    /// Recording or paused
    pub fn is_capturing(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Stopping => write!(f, "stopping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [SessionState; 5] = [
        SessionState::Idle,
        SessionState::Acquiring,
        SessionState::Recording,
        SessionState::Paused,
        SessionState::Stopping,
    ];

    #[test]
    fn test_happy_path() {
        let mut state = SessionState::default();
        for action in [
            SessionAction::Start,
            SessionAction::AcquisitionSucceeded,
            SessionAction::Pause,
            SessionAction::Resume,
            SessionAction::Stop,
            SessionAction::FlushComplete,
        ] {
            state = state.next(action).expect("transition should be allowed");
        }
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_start_only_from_idle() {
        for state in ALL_STATES {
            let allowed = state.next(SessionAction::Start).is_some();
            assert_eq!(allowed, state == SessionState::Idle, "start from {}", state);
        }
    }

    #[test]
    fn test_pause_toggle_only_while_capturing() {
        for state in ALL_STATES {
            assert_eq!(
                state.next(SessionAction::Pause).is_some(),
                state == SessionState::Recording
            );
            assert_eq!(
                state.next(SessionAction::Resume).is_some(),
                state == SessionState::Paused
            );
        }
    }

    #[test]
    fn test_stop_from_recording_or_paused() {
        assert_eq!(
            SessionState::Paused.next(SessionAction::Stop),
            Some(SessionState::Stopping)
        );
        assert_eq!(SessionState::Idle.next(SessionAction::Stop), None);
        assert_eq!(SessionState::Acquiring.next(SessionAction::Stop), None);
        assert_eq!(SessionState::Stopping.next(SessionAction::Stop), None);
    }

    #[test]
    fn test_failed_acquisition_returns_to_idle() {
        assert_eq!(
            SessionState::Acquiring.next(SessionAction::AcquisitionFailed),
            Some(SessionState::Idle)
        );
    }

    #[test]
    fn test_chunk_acceptance() {
        assert!(SessionState::Recording.accepts_chunks());
        assert!(SessionState::Stopping.accepts_chunks());
        assert!(!SessionState::Paused.accepts_chunks());
        assert!(!SessionState::Idle.accepts_chunks());
        assert!(!SessionState::Acquiring.accepts_chunks());
    }
}
