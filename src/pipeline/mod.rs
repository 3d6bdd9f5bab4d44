//! Pipeline orchestration module
//!
//! Coordinates recorder output, the transcode engine, and the external
//! storage/record boundaries.

pub mod coordinator;

pub use coordinator::{ArtifactRef, PipelineCoordinator, PipelineError};
