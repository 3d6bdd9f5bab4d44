//! clipcast CLI
//!
//! Usage:
//!   clipcast trim <INPUT> --start 2.0 --end 7.5 --output clip.mp4
//!   clipcast publish <INPUT> --start 2.0 --end 7.5 [--title ...]
//!   clipcast check

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use clipcast::capture::MediaFormat;
use clipcast::config::AppConfig;
use clipcast::pipeline::PipelineCoordinator;
use clipcast::recorder::CapturedArtifact;
use clipcast::storage::LocalStorage;
use clipcast::transcode::{FfmpegRuntime, TranscodeEngine, TrimRange};
use clipcast::videos::MemoryVideoStore;

#[derive(Parser)]
#[command(
    name = "clipcast",
    about = "Trim and publish screen recordings",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(long, global = true, env = "CLIPCAST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim a captured recording into a playable clip
    Trim {
        /// Input recording (.webm or .mp4)
        input: PathBuf,

        /// Trim start in seconds
        #[arg(long)]
        start: f64,

        /// Trim end in seconds
        #[arg(long)]
        end: f64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Trim a recording and publish it to the configured storage
    Publish {
        /// Input recording (.webm or .mp4)
        input: PathBuf,

        /// Trim start in seconds
        #[arg(long)]
        start: f64,

        /// Trim end in seconds
        #[arg(long)]
        end: f64,

        /// Title for the video record
        #[arg(long)]
        title: Option<String>,
    },

    /// Verify the media runtime is available
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    clipcast::init_tracing(cli.verbose);

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Trim {
            input,
            start,
            end,
            output,
        } => {
            let artifact = load_artifact(&input).await?;
            let engine = engine_for(&config).await?;

            let result = engine
                .trim(&artifact, TrimRange::new(start, end))
                .await
                .context("transcode failed")?;

            tokio::fs::write(&output, &result.data)
                .await
                .with_context(|| format!("writing {:?}", output))?;

            println!(
                "wrote {} ({} bytes, {}, via {})",
                output.display(),
                result.data.len(),
                result.media_type,
                result.strategy
            );
        }

        Commands::Publish {
            input,
            start,
            end,
            title,
        } => {
            let artifact = load_artifact(&input).await?;
            let engine = engine_for(&config).await?;

            let storage = Arc::new(LocalStorage::new(
                config.storage.upload_dir.clone(),
                config.storage.public_base.clone(),
            ));
            let videos = Arc::new(MemoryVideoStore::new());
            let coordinator = PipelineCoordinator::new(engine, storage, videos);

            let published = coordinator
                .run(&artifact, TrimRange::new(start, end), title)
                .await
                .context("publish failed")?;

            println!("published video {} at {}", published.video_id, published.url);
        }

        Commands::Check => {
            FfmpegRuntime::global().await?;
            println!("media runtime OK");
        }
    }

    Ok(())
}

/// Read a recording from disk into a captured artifact.
///
/// The duration is unknown for ingested files, which disables the trim
/// range's upper-bound check; ffmpeg still fails cleanly on an
/// out-of-range window.
async fn load_artifact(input: &PathBuf) -> Result<CapturedArtifact> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let Some(format) = MediaFormat::from_extension(extension) else {
        bail!("unsupported input extension: {:?}", input);
    };

    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {:?}", input))?;
    if data.is_empty() {
        bail!("input file is empty: {:?}", input);
    }

    Ok(CapturedArtifact {
        data,
        format,
        duration_secs: 0.0,
    })
}

async fn engine_for(config: &AppConfig) -> Result<TranscodeEngine> {
    match &config.transcode.ffmpeg_path {
        Some(path) => {
            let runtime = FfmpegRuntime::initialize(Some(path.clone())).await?;
            Ok(TranscodeEngine::with_runtime(Arc::new(runtime)))
        }
        None => Ok(TranscodeEngine::shared().await?),
    }
}
