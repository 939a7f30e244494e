use crate::e2e::helpers;

use helpers::mocks::{MockFailure, MockTtsRepository};
use helpers::{count_entries, TestPipeline};
use narrator_backend::domain::generation::{
    GenerationError, GenerationRequest, GenerationServiceApi, SynthesisOptions,
};
use narrator_backend::infrastructure::repositories::TtsError;
use pretty_assertions::assert_eq;
use std::sync::Mutex;
use std::time::Duration;

const THREE_SENTENCES: &str =
    "First sentence is here. Second sentence is here. Third sentence is here.";

#[tokio::test]
async fn it_should_generate_one_file_from_ordered_chunks() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;

    let outcome = pipeline
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"))
        .await
        .unwrap();

    assert_eq!(outcome.chunk_count, 3);
    assert_eq!(outcome.character_count, THREE_SENTENCES.chars().count());
    assert_eq!(
        outcome.summary_message,
        format!(
            "Successfully generated audio from {} characters in 3 chunks",
            THREE_SENTENCES.chars().count()
        )
    );

    assert_eq!(pipeline.backend.call_indices(), vec![0, 1, 2]);

    let stitched = tokio::fs::read_to_string(&outcome.final_artifact_path).await.unwrap();
    assert_eq!(
        stitched,
        "First sentence is here.\nSecond sentence is here.\nThird sentence is here."
    );

    // Job workspace is gone once the final file exists
    assert_eq!(count_entries(&pipeline.temp_dir).await, 0);
}

#[tokio::test]
async fn it_should_discard_all_chunk_audio_when_a_chunk_fails() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
    pipeline.backend.fail_on(1, MockFailure::Synthesis);

    let err = pipeline
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"))
        .await
        .unwrap_err();

    match err {
        GenerationError::SynthesisFailed {
            chunk_index,
            source,
        } => {
            assert_eq!(chunk_index, 1);
            assert!(matches!(source, TtsError::SynthesisFailed(_)));
        }
        other => panic!("expected SynthesisFailed, got {:?}", other),
    }

    // Chunk 2 is never attempted and nothing survives, including the partial file
    assert_eq!(pipeline.backend.call_indices(), vec![0, 1]);
    assert_eq!(count_entries(&pipeline.temp_dir).await, 0);
    assert_eq!(count_entries(&pipeline.output_dir).await, 0);
    assert!(pipeline.stitcher.inputs().is_empty());
}

#[tokio::test]
async fn it_should_surface_rate_limits_with_the_chunk_index() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
    pipeline.backend.fail_on(2, MockFailure::RateLimited);

    let err = pipeline
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::RateLimited { chunk_index: 2, .. }));
    assert_eq!(count_entries(&pipeline.temp_dir).await, 0);
}

#[tokio::test]
async fn it_should_keep_chunk_audio_when_stitching_fails() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
    pipeline.stitcher.set_failing(true);

    let err = pipeline
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::StitchFailed(_)));
    assert_eq!(count_entries(&pipeline.output_dir).await, 0);

    // One job workspace holding all three chunk files
    let inputs = pipeline.stitcher.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].len(), 3);
    for artifact in &inputs[0] {
        assert!(artifact.exists(), "{} should be retained", artifact.display());
    }
    assert_eq!(count_entries(&pipeline.temp_dir).await, 1);
}

#[tokio::test]
async fn it_should_pass_artifacts_to_the_stitcher_in_index_order() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;

    pipeline
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "kani-andrew"))
        .await
        .unwrap();

    let inputs = pipeline.stitcher.inputs();
    let names: Vec<String> = inputs[0]
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["chunk_0000.wav", "chunk_0001.wav", "chunk_0002.wav"]);
}

#[tokio::test]
async fn it_should_reject_invalid_requests_before_synthesis() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;

    let cases = [
        GenerationRequest::new("   \n ", "coqui-tacotron2"),
        GenerationRequest::new("Hello there.", ""),
        GenerationRequest::new("Hello there.", "no-such-voice"),
        // Cloning needs a reference recording
        GenerationRequest::new("Hello there.", "voice_clone_xtts"),
    ];

    for request in cases {
        let err = pipeline.service.generate(request).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::InvalidInput(_)),
            "expected InvalidInput, got {:?}",
            err
        );
    }

    assert!(pipeline.backend.calls().is_empty());
    assert_eq!(count_entries(&pipeline.temp_dir).await, 0);
}

#[tokio::test]
async fn it_should_forward_reference_audio_to_the_backend() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
    let reference = pipeline.temp_dir.join("reference.wav");
    tokio::fs::write(&reference, b"RIFF").await.unwrap();

    let request = GenerationRequest::new("Hello there.", "voice_clone_xtts").with_options(
        SynthesisOptions {
            reference_audio: Some(reference.clone()),
            language: Some("en".to_string()),
        },
    );
    pipeline.service.generate(request).await.unwrap();

    let calls = pipeline.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].voice_model_id, "voice_clone_xtts");

    // The backend reads a copy owned by the job workspace
    let forwarded = calls[0].reference_audio.clone().expect("reference forwarded");
    assert_ne!(forwarded, reference);
    assert!(forwarded.starts_with(&pipeline.temp_dir));
    assert_eq!(forwarded.file_name().unwrap(), "reference.wav");
    assert!(!forwarded.exists());
    assert!(reference.exists());
}

#[tokio::test]
async fn it_should_keep_a_running_clone_job_safe_from_other_jobs_cleanup() {
    let backend = MockTtsRepository::local().with_clone_delay(Duration::from_millis(300));
    let pipeline =
        TestPipeline::with_temp_max_age(backend, 40, Duration::from_millis(100)).await;

    let upload = pipeline.temp_dir.join("reference_upload.wav");
    tokio::fs::write(&upload, b"RIFF").await.unwrap();

    let clone_job = pipeline.service.generate(
        GenerationRequest::new(THREE_SENTENCES, "voice_clone_xtts").with_options(SynthesisOptions {
            reference_audio: Some(upload.clone()),
            language: None,
        }),
    );
    // Finishes mid-way through the clone job and sweeps stale temp entries
    let quick_job = async {
        tokio::time::sleep(Duration::from_millis(450)).await;
        pipeline
            .service
            .generate(GenerationRequest::new("Hello there.", "coqui-tacotron2"))
            .await
    };

    let (clone_result, quick_result) = tokio::join!(clone_job, quick_job);
    quick_result.unwrap();
    let outcome = clone_result.unwrap();
    assert_eq!(outcome.chunk_count, 3);

    let stitched = tokio::fs::read_to_string(&outcome.final_artifact_path).await.unwrap();
    assert_eq!(
        stitched,
        "First sentence is here.\nSecond sentence is here.\nThird sentence is here."
    );
}

#[tokio::test]
async fn it_should_report_progress_after_every_chunk() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
    let seen = Mutex::new(Vec::new());

    pipeline
        .service
        .generate_with_progress(
            GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"),
            &|completed: usize, total: usize| seen.lock().unwrap().push((completed, total)),
        )
        .await
        .unwrap();

    assert_eq!(seen.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test(start_paused = true)]
async fn it_should_pause_between_remote_requests_only() {
    let remote = TestPipeline::new(MockTtsRepository::remote(), 40).await;
    let start = tokio::time::Instant::now();
    remote
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "facebook/mms-tts-eng"))
        .await
        .unwrap();
    let elapsed = start.elapsed();
    // Two gaps between three chunks, none after the last
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);

    let local = TestPipeline::new(MockTtsRepository::local(), 40).await;
    let start = tokio::time::Instant::now();
    local
        .service
        .generate(GenerationRequest::new(THREE_SENTENCES, "coqui-tacotron2"))
        .await
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn it_should_estimate_without_synthesizing() {
    let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;

    let estimate = pipeline.service.estimate(THREE_SENTENCES);
    assert_eq!(estimate.chunk_count, 3);
    assert_eq!(estimate.estimated_duration_minutes, 1);

    let empty = pipeline.service.estimate("");
    assert_eq!(empty.chunk_count, 0);
    assert_eq!(empty.estimated_duration_minutes, 1);

    assert!(pipeline.backend.calls().is_empty());
}
