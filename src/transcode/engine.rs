//! Trim/transcode engine
//!
//! Validates the requested window, writes the captured bytes into the
//! runtime workspace, and walks the strategy ladder in order until one
//! tier produces a playable output.

use std::sync::Arc;

use uuid::Uuid;

use super::runtime::{FfmpegRuntime, MediaRuntime};
use super::strategy::ladder_for;
use super::types::{AttemptFailure, TranscodeError, TranscodeResult, TrimRange};
use crate::recorder::state::CapturedArtifact;

/// Trim engine over a media runtime.
pub struct TranscodeEngine {
    runtime: Arc<dyn MediaRuntime>,
}

impl TranscodeEngine {
    /// Engine backed by the process-wide ffmpeg runtime.
    ///
    /// The first call initializes the runtime; later calls reuse it.
    pub async fn shared() -> Result<Self, TranscodeError> {
        let runtime = FfmpegRuntime::global().await?;
        Ok(Self { runtime })
    }

    /// Engine over an explicit runtime (tests, custom deployments)
    pub fn with_runtime(runtime: Arc<dyn MediaRuntime>) -> Self {
        Self { runtime }
    }

    /// Trim `artifact` to `range`, falling through the strategy ladder.
    ///
    /// Attempts run strictly sequentially and are fully isolated: every
    /// tier re-issues the complete command against the original input file
    /// with a fresh output name, so a failed tier leaves nothing behind for
    /// the next one to trip over. The first success wins; if every tier
    /// fails the error carries all per-tier failures.
    pub async fn trim(
        &self,
        artifact: &CapturedArtifact,
        range: TrimRange,
    ) -> Result<TranscodeResult, TranscodeError> {
        range.validate(Some(artifact.duration_secs))?;

        let call_id = Uuid::new_v4().simple().to_string();
        let input_name = format!("input-{}.{}", call_id, artifact.format.extension());
        self.runtime.write_input(&input_name, &artifact.data).await?;

        let ladder = ladder_for(artifact.format);
        let mut attempts: Vec<AttemptFailure> = Vec::new();

        tracing::debug!(
            "trimming {} bytes of {} to ({:.3}, {:.3}) across {} tier(s)",
            artifact.size(),
            artifact.media_type(),
            range.start_secs,
            range.end_secs,
            ladder.len()
        );

        for strategy in ladder {
            let output_name = format!("output-{}-{}.{}", call_id, strategy.name, strategy.extension());
            let args = strategy.build_args(&input_name, range, &output_name);

            match self.runtime.exec(&args).await {
                Ok(()) => match self.runtime.read_output(&output_name).await {
                    Ok(data) if !data.is_empty() => {
                        self.runtime.remove(&input_name).await;
                        self.runtime.remove(&output_name).await;
                        tracing::info!(
                            "transcode succeeded via {} ({} bytes)",
                            strategy.name,
                            data.len()
                        );
                        return Ok(TranscodeResult {
                            data,
                            media_type: strategy.media_type(),
                            extension: strategy.extension(),
                            duration_secs: range.duration_secs(),
                            strategy: strategy.name,
                        });
                    }
                    Ok(_) => {
                        tracing::warn!("strategy {} produced an empty file", strategy.name);
                        attempts.push(AttemptFailure {
                            strategy: strategy.name.to_string(),
                            message: "produced empty output".to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!("strategy {} output unreadable: {}", strategy.name, e);
                        attempts.push(AttemptFailure {
                            strategy: strategy.name.to_string(),
                            message: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    tracing::warn!("strategy {} failed: {}", strategy.name, e);
                    attempts.push(AttemptFailure {
                        strategy: strategy.name.to_string(),
                        message: e.to_string(),
                    });
                }
            }

            self.runtime.remove(&output_name).await;
        }

        self.runtime.remove(&input_name).await;
        tracing::error!("all {} transcode tier(s) failed", attempts.len());
        Err(TranscodeError::TranscodeFailed { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::format::MediaFormat;
    use crate::testing::{ExecScript, ScriptedRuntime};

    fn artifact(duration_secs: f64) -> CapturedArtifact {
        CapturedArtifact {
            data: vec![7u8; 4_096],
            format: MediaFormat::WebmVp8Opus,
            duration_secs,
        }
    }

    fn engine(script: ExecScript) -> (TranscodeEngine, Arc<ScriptedRuntime>) {
        let runtime = Arc::new(ScriptedRuntime::new(script));
        (TranscodeEngine::with_runtime(runtime.clone()), runtime)
    }

    #[tokio::test]
    async fn invalid_range_rejects_before_any_runtime_call() {
        let (engine, runtime) = engine(ExecScript::Succeed);

        let err = engine
            .trim(&artifact(10.0), TrimRange::new(5.0, 5.0))
            .await
            .unwrap_err();

        assert!(matches!(err, TranscodeError::InvalidRange(_)));
        assert_eq!(runtime.exec_count(), 0);
    }

    #[tokio::test]
    async fn copy_tier_wins_when_it_succeeds() {
        let (engine, runtime) = engine(ExecScript::Succeed);

        let result = engine
            .trim(&artifact(10.0), TrimRange::new(2.0, 7.0))
            .await
            .unwrap();

        assert_eq!(result.strategy, "webm-copy");
        assert_eq!(result.media_type, "video/webm");
        assert!((result.duration_secs - 5.0).abs() < 1e-9);
        assert_eq!(runtime.exec_count(), 1);
    }

    #[tokio::test]
    async fn failed_copy_falls_through_to_vp8() {
        let (engine, runtime) = engine(ExecScript::FailCopy);

        let result = engine
            .trim(&artifact(10.0), TrimRange::new(2.0, 7.0))
            .await
            .unwrap();

        assert_eq!(result.strategy, "webm-vp8");
        assert_eq!(result.media_type, "video/webm");
        assert_eq!(runtime.exec_count(), 2);
    }

    #[tokio::test]
    async fn fallback_tier_is_deterministic_across_calls() {
        let (engine, _runtime) = engine(ExecScript::FailCopy);

        for _ in 0..3 {
            let result = engine
                .trim(&artifact(10.0), TrimRange::new(1.0, 4.0))
                .await
                .unwrap();
            assert_eq!(result.strategy, "webm-vp8");
        }
    }

    #[tokio::test]
    async fn cross_container_tier_changes_media_type() {
        let (engine, _runtime) = engine(ExecScript::SucceedOnlyExtension("mp4"));

        let result = engine
            .trim(&artifact(10.0), TrimRange::new(2.0, 7.0))
            .await
            .unwrap();

        assert_eq!(result.strategy, "mp4-h264");
        assert_eq!(result.media_type, "video/mp4");
        assert_ne!(result.media_type, artifact(10.0).format.container().media_type());
    }

    #[tokio::test]
    async fn exhausted_ladder_reports_every_failure() {
        let (engine, runtime) = engine(ExecScript::FailAll);

        let err = engine
            .trim(&artifact(10.0), TrimRange::new(2.0, 7.0))
            .await
            .unwrap_err();

        match err {
            TranscodeError::TranscodeFailed { attempts } => {
                assert_eq!(attempts.len(), 4);
                assert_eq!(attempts[0].strategy, "webm-copy");
                assert!(attempts.iter().all(|a| !a.message.is_empty()));
            }
            other => panic!("expected TranscodeFailed, got {other:?}"),
        }
        assert_eq!(runtime.exec_count(), 4);
    }

    #[tokio::test]
    async fn attempts_run_in_ladder_order() {
        let (engine, runtime) = engine(ExecScript::FailAll);
        let _ = engine.trim(&artifact(10.0), TrimRange::new(0.0, 1.0)).await;

        let log = runtime.exec_log();
        let outputs: Vec<String> = log
            .iter()
            .map(|args| args.last().cloned().unwrap_or_default())
            .collect();
        assert!(outputs[0].contains("webm-copy"));
        assert!(outputs[1].contains("webm-vp8"));
        assert!(outputs[2].contains("webm-vp9"));
        assert!(outputs[3].contains("mp4-h264"));
    }

    #[tokio::test]
    async fn commands_carry_sub_second_times() {
        let (engine, runtime) = engine(ExecScript::Succeed);
        engine
            .trim(&artifact(10.0), TrimRange::new(2.5, 7.1))
            .await
            .unwrap();

        let log = runtime.exec_log();
        let joined = log[0].join(" ");
        assert!(joined.contains("-ss 2.500"));
        assert!(joined.contains("-t 4.600"));
    }

    #[tokio::test]
    async fn concurrent_calls_use_distinct_workspace_names() {
        let runtime = Arc::new(ScriptedRuntime::new(ExecScript::Succeed));
        let engine = Arc::new(TranscodeEngine::with_runtime(runtime.clone()));

        let a = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.trim(&artifact(10.0), TrimRange::new(0.0, 1.0)).await
            })
        };
        let b = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.trim(&artifact(10.0), TrimRange::new(1.0, 2.0)).await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let log = runtime.exec_log();
        let inputs: Vec<&String> = log
            .iter()
            .map(|args| {
                let i = args.iter().position(|a| a == "-i").unwrap();
                &args[i + 1]
            })
            .collect();
        assert_ne!(inputs[0], inputs[1]);
    }
}
