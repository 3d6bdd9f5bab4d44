//! End-to-end pipeline tests
//!
//! Drive the full capture → trim → publish flow over synthetic sources and
//! a scripted media runtime, without hardware or an ffmpeg install.

use std::sync::Arc;
use std::time::Duration;

use clipcast::pipeline::{PipelineCoordinator, PipelineError};
use clipcast::recorder::{CaptureRecorder, RecorderConfig, RecorderError};
use clipcast::storage::{ByteRange, LocalStorage, StorageService};
use clipcast::testing::{ExecScript, ScriptedRuntime, SyntheticEncoder, SyntheticSource};
use clipcast::transcode::{TranscodeEngine, TranscodeError, TrimRange};
use clipcast::videos::{MemoryVideoStore, VideoStore};

fn synthetic_recorder() -> CaptureRecorder {
    CaptureRecorder::new(
        Box::new(SyntheticSource::display()),
        Box::new(SyntheticSource::microphone()),
        Box::new(SyntheticEncoder::new().with_chunk_size(1_000)),
        RecorderConfig::default(),
    )
}

fn coordinator_over(
    script: ExecScript,
    upload_dir: &std::path::Path,
) -> (PipelineCoordinator, Arc<ScriptedRuntime>, Arc<MemoryVideoStore>) {
    let runtime = Arc::new(ScriptedRuntime::new(script));
    let engine = TranscodeEngine::with_runtime(runtime.clone());
    let storage = Arc::new(LocalStorage::new(upload_dir.to_path_buf(), "/uploads"));
    let videos = Arc::new(MemoryVideoStore::new());
    (
        PipelineCoordinator::new(engine, storage, videos.clone()),
        runtime,
        videos,
    )
}

/// Let woken tasks run between clock advances.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn record_trim_publish_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    let (coordinator, runtime, videos) = coordinator_over(ExecScript::Succeed, &upload_dir);

    let mut recorder = synthetic_recorder();
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;

    let published = coordinator
        .record_and_publish(
            &mut recorder,
            TrimRange::new(0.5, 2.5),
            Some("Demo clip".to_string()),
        )
        .await
        .unwrap();

    assert!(published.url.starts_with("/uploads/"));
    assert_eq!(runtime.exec_count(), 1);

    let record = videos.get(&published.video_id).await.unwrap().unwrap();
    assert_eq!(record.title, "Demo clip");
    assert!((record.duration_secs - 2.0).abs() < 1e-9);
    assert_eq!(record.url, published.url);

    // The uploaded object is retrievable through the storage boundary,
    // including partial reads.
    let storage = LocalStorage::new(upload_dir, "/uploads");
    let stored = storage.fetch(&record.filename, None).await.unwrap();
    assert!(!stored.is_empty());
    let partial = storage
        .fetch(&record.filename, Some(ByteRange { start: 0, end: Some(3) }))
        .await
        .unwrap();
    assert_eq!(partial.len(), 4);
    assert_eq!(&stored[..4], &partial[..]);
}

#[tokio::test(start_paused = true)]
async fn failed_transcode_keeps_artifact_and_skips_upload() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    let (coordinator, _runtime, _videos) = coordinator_over(ExecScript::FailAll, &upload_dir);

    let mut recorder = synthetic_recorder();
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    let artifact = recorder.stop().await.unwrap();
    let err = coordinator
        .run(&artifact, TrimRange::new(0.0, 1.0), None)
        .await
        .unwrap_err();

    match err {
        PipelineError::Transcode(TranscodeError::TranscodeFailed { attempts }) => {
            assert!(!attempts.is_empty());
        }
        other => panic!("expected TranscodeFailed, got {other:?}"),
    }

    // Upload boundary never invoked: nothing was written.
    assert!(!upload_dir.exists());

    // The artifact survives the failure and works with a healthier engine.
    let (retry_coordinator, _, _) = coordinator_over(ExecScript::FailCopy, &upload_dir);
    let published = retry_coordinator
        .run(&artifact, TrimRange::new(0.0, 1.5), None)
        .await
        .unwrap();
    assert!(published.url.starts_with("/uploads/"));
}

#[tokio::test(start_paused = true)]
async fn invalid_range_never_reaches_runtime_or_storage() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    let (coordinator, runtime, _videos) = coordinator_over(ExecScript::Succeed, &upload_dir);

    let mut recorder = synthetic_recorder();
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    let artifact = recorder.stop().await.unwrap();

    let err = coordinator
        .run(&artifact, TrimRange::new(1.5, 1.5), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Transcode(TranscodeError::InvalidRange(_))
    ));
    assert_eq!(runtime.exec_count(), 0);
    assert!(!upload_dir.exists());
}

#[tokio::test(start_paused = true)]
async fn empty_capture_aborts_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    let (coordinator, runtime, _videos) = coordinator_over(ExecScript::Succeed, &upload_dir);

    let mut recorder = CaptureRecorder::new(
        Box::new(SyntheticSource::display()),
        Box::new(SyntheticSource::microphone()),
        Box::new(SyntheticEncoder::silent()),
        RecorderConfig::default(),
    );
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    let err = coordinator
        .record_and_publish(&mut recorder, TrimRange::new(0.0, 1.0), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Recorder(RecorderError::EmptyCapture)
    ));
    assert_eq!(runtime.exec_count(), 0);
    assert!(!upload_dir.exists());
}

#[tokio::test(start_paused = true)]
async fn published_record_accumulates_views_and_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, _runtime, videos) =
        coordinator_over(ExecScript::Succeed, &dir.path().join("uploads"));

    let mut recorder = synthetic_recorder();
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    let published = coordinator
        .record_and_publish(&mut recorder, TrimRange::new(0.0, 1.0), None)
        .await
        .unwrap();

    videos.increment_views(&published.video_id).await.unwrap();
    videos
        .append_completion(&published.video_id, 80.0)
        .await
        .unwrap();
    videos
        .append_completion(&published.video_id, 40.0)
        .await
        .unwrap();

    let record = videos.get(&published.video_id).await.unwrap().unwrap();
    assert_eq!(record.views, 1);
    assert_eq!(record.average_completion(), Some(60.0));
}

#[tokio::test(start_paused = true)]
async fn fallback_result_media_type_matches_winning_tier() {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    let (coordinator, runtime, videos) =
        coordinator_over(ExecScript::SucceedOnlyExtension("mp4"), &upload_dir);

    let mut recorder = synthetic_recorder();
    recorder.start().await.unwrap();
    settle().await;
    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;

    let published = coordinator
        .record_and_publish(&mut recorder, TrimRange::new(0.0, 2.0), None)
        .await
        .unwrap();

    // Copy and same-family tiers all failed before the cross-container win.
    assert_eq!(runtime.exec_count(), 4);
    let record = videos.get(&published.video_id).await.unwrap().unwrap();
    assert!(record.filename.ends_with(".mp4"));
}
