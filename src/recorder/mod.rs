//! Recording system module
//!
//! Implements the capture session state machine:
//! - `CaptureRecorder` drives acquisition, chunk emission, and teardown
//! - session state and the captured artifact live in `state`

pub mod recorder;
pub mod state;

pub use recorder::{CaptureRecorder, RecorderError, RecorderEvent, RecorderResult};
pub use state::{CapturedArtifact, RecorderConfig, RecorderState, SessionSpan};
