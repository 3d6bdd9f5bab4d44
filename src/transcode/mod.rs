//! Trim/transcode module
//!
//! A process-wide media runtime plus the engine that walks an ordered
//! codec/container strategy ladder until one tier produces a playable
//! output.

pub mod engine;
pub mod runtime;
pub mod strategy;
pub mod types;

pub use engine::TranscodeEngine;
pub use runtime::{FfmpegRuntime, MediaRuntime, RuntimeError};
pub use strategy::{ladder_for, StrategyMode, TranscodeStrategy};
pub use types::{AttemptFailure, TranscodeError, TranscodeResult, TrimRange};
