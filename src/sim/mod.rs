//! Simulated platform
//!
//! Scriptable capture and encoder backends. Used by the test suite and by
//! the binary when no real platform integration is linked in.

mod capture;
mod encoder;

pub use capture::{CaptureRequest, CaptureScript, SimulatedCapture};
pub use encoder::{EncoderScript, SimulatedEncoder};
