//! clipcast: capture, trim, and publish screen recordings.
//!
//! Headless pipeline: a recorder composes live display and microphone
//! tracks into a durable captured artifact, a transcode engine trims it
//! through a tiered codec/container fallback, and a coordinator publishes
//! the result through the storage and video-record boundaries.

pub mod capture;
pub mod config;
pub mod pipeline;
pub mod recorder;
pub mod storage;
pub mod testing;
pub mod transcode;
pub mod utils;
pub mod videos;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for binaries.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "clipcast=debug"
    } else {
        "clipcast=info"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
