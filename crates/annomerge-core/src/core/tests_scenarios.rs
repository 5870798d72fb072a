//! End-to-End Merge Scenarios
//!
//! Classify a realistic upload set, merge it with a stub video probe, and
//! check the record, the report and the progress ticks together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::decoders::{Decoder, DecoderSet, PipelineRecord};
use crate::core::ingest::{AnnotationMerger, ClassifiedFile, FileCategory, FileClassifier};
use crate::core::media::{InputFile, VideoInfo, VideoProbe};
use crate::core::settings::IngestSettings;
use crate::core::{CoreError, CoreResult, Pipeline};

// =============================================================================
// Fixtures
// =============================================================================

/// Reports a fixed 1080p, two-minute video for whatever file it is given
struct StaticProbe;

#[async_trait]
impl VideoProbe for StaticProbe {
    async fn probe(&self, file: &InputFile) -> CoreResult<VideoInfo> {
        Ok(VideoInfo {
            filename: file.name().to_string(),
            duration: 120.0,
            width: 1920,
            height: 1080,
            frame_rate: 25.0,
        })
    }
}

struct FailingProbe;

#[async_trait]
impl VideoProbe for FailingProbe {
    async fn probe(&self, _file: &InputFile) -> CoreResult<VideoInfo> {
        Err(CoreError::FFprobeError("moov atom not found".to_string()))
    }
}

/// Counts calls and returns a single record
struct CountingDecoder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Decoder for CountingDecoder {
    type Record = PipelineRecord;

    async fn decode(&self, _file: &InputFile) -> CoreResult<Vec<PipelineRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![json!({ "source": "separate" })])
    }
}

fn merger() -> AnnotationMerger {
    AnnotationMerger::with_parts(
        IngestSettings::default(),
        DecoderSet::default(),
        Box::new(StaticProbe),
    )
}

fn video(name: &str) -> InputFile {
    InputFile::from_bytes(name, Some("video/mp4"), vec![0u8; 32])
}

fn text(name: &str, content: &str) -> InputFile {
    InputFile::from_bytes(name, None, content.as_bytes().to_vec())
}

fn json_file(name: &str, value: Value) -> InputFile {
    InputFile::from_bytes(name, Some("application/json"), value.to_string().into_bytes())
}

const TRANSCRIPT: &str = "WEBVTT

00:00:01.000 --> 00:00:03.000
<v Host>Welcome back

00:00:04.000 --> 00:00:06.500
<v Guest>Thanks for having me
";

fn bundle(person_frames: usize) -> Value {
    let person: Vec<Value> = (0..person_frames)
        .map(|frame| json!({ "frame": frame, "bbox": [10, 20, 30, 40], "keypoints": [] }))
        .collect();
    json!({
        "video_path": "/runs/clip.mp4",
        "pipeline_results": {
            "person": { "results": person, "processing_time": 12.25 },
            "face": { "results": [], "processing_time": 1.5 },
            "scene": { "results": [{ "start_time": 0.0, "end_time": 60.0 }], "processing_time": 0.25 }
        },
        "config": { "device": "cuda" },
        "start_time": "2026-03-01T12:00:00",
        "total_duration": 14.0
    })
}

async fn classify(files: &[InputFile]) -> Vec<ClassifiedFile> {
    FileClassifier::default().classify_all(files).await
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_video_and_transcript() {
    let files = classify(&[video("clip.mp4"), text("clip.vtt", TRANSCRIPT)]).await;
    let vtt = files.iter().find(|f| f.name() == "clip.vtt").unwrap();
    assert_eq!(vtt.category, FileCategory::SpeechRecognition);
    assert_eq!(vtt.confidence, 0.9);

    let outcome = merger().merge(&files, None).await.unwrap();
    let record = &outcome.record;

    assert_eq!(record.video_info.filename, "clip.mp4");
    assert_eq!(record.video_info.duration, 120.0);
    let cues = record.speech_recognition.as_ref().unwrap();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[1].speaker.as_deref(), Some("Guest"));
    assert_eq!(record.metadata.pipelines, [Pipeline::SpeechRecognition]);
    assert!(record.has_pipeline(Pipeline::SpeechRecognition));
    assert!(!record.has_pipeline(Pipeline::PersonTracking));
    assert!(record.metadata.processing_config.is_none());

    assert_eq!(outcome.report.files_processed, 2);
    assert_eq!(outcome.report.pipelines_found, [Pipeline::SpeechRecognition]);
    assert!(outcome.report.warnings.is_empty());
}

#[tokio::test]
async fn test_complete_results_bundle() {
    let files = classify(&[video("clip.mp4"), json_file("complete_results.json", bundle(5))]).await;
    let classified = files.iter().find(|f| f.name() == "complete_results.json").unwrap();
    assert_eq!(classified.category, FileCategory::CompleteResults);
    assert_eq!(classified.confidence, 0.95);

    let outcome = merger().merge(&files, None).await.unwrap();
    let record = &outcome.record;

    assert_eq!(record.person_tracking.as_ref().unwrap().len(), 5);
    assert_eq!(record.scene_detection.as_ref().unwrap().len(), 1);
    assert!(record.face_analysis.is_none());
    assert_eq!(record.metadata.processing_time, Some(14.0));
    assert_eq!(record.metadata.total_duration, Some(14.0));
    assert_eq!(
        record.metadata.processing_config,
        Some(json!({ "device": "cuda" }))
    );
    assert_eq!(
        record.metadata.pipelines,
        [Pipeline::PersonTracking, Pipeline::SceneDetection]
    );
    assert!(outcome.report.warnings.is_empty());
}

#[tokio::test]
async fn test_corrupt_json_becomes_single_warning() {
    let files = classify(&[
        video("clip.mp4"),
        text("clip.vtt", TRANSCRIPT),
        text("broken.json", "{\"annotations\": [{\"face_id\": "),
    ])
    .await;

    let outcome = merger().merge(&files, None).await.unwrap();
    assert!(outcome.record.speech_recognition.is_some());
    assert_eq!(outcome.report.pipelines_found, [Pipeline::SpeechRecognition]);
    assert!(outcome.report.is_partial());
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.warnings[0].contains("broken.json"));
    assert_eq!(outcome.report.files_processed, 3);
}

#[tokio::test]
async fn test_bundle_takes_precedence_over_separate_file() {
    let calls = Arc::new(AtomicUsize::new(0));
    let decoders = DecoderSet {
        person_tracking: Box::new(CountingDecoder {
            calls: calls.clone(),
        }),
        ..Default::default()
    };
    let merger =
        AnnotationMerger::with_parts(IngestSettings::default(), decoders, Box::new(StaticProbe));

    let files = classify(&[
        json_file("tracking.json", json!([{ "keypoints": [], "bbox": [] }])),
        video("clip.mp4"),
        json_file("complete_results.json", bundle(3)),
    ])
    .await;

    let outcome = merger.merge(&files, None).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let person = outcome.record.person_tracking.as_ref().unwrap();
    assert_eq!(person.len(), 3);
    assert!(person.iter().all(|r| r.get("source").is_none()));
    assert!(outcome.report.warnings.is_empty());
}

#[tokio::test]
async fn test_separate_file_fills_slot_missing_from_bundle() {
    let files = classify(&[
        video("clip.mp4"),
        json_file("complete_results.json", bundle(2)),
        json_file("faces.json", json!([{ "face_id": 7, "attributes": { "age": 30 } }])),
    ])
    .await;

    let outcome = merger().merge(&files, None).await.unwrap();
    assert_eq!(outcome.record.face_analysis.as_ref().unwrap().len(), 1);
    assert_eq!(
        outcome.record.metadata.pipelines,
        [
            Pipeline::PersonTracking,
            Pipeline::SceneDetection,
            Pipeline::FaceAnalysis
        ]
    );
}

#[tokio::test]
async fn test_missing_video_is_fatal() {
    let files = classify(&[
        text("clip.vtt", TRANSCRIPT),
        json_file("complete_results.json", bundle(5)),
    ])
    .await;

    let result = merger().merge(&files, None).await;
    assert!(matches!(result, Err(CoreError::MissingVideo)));
}

#[tokio::test]
async fn test_last_video_wins_silently() {
    let files = classify(&[video("first.mp4"), video("second.mov")]).await;

    let outcome = merger().merge(&files, None).await.unwrap();
    assert_eq!(outcome.record.video_info.filename, "second.mov");
    assert!(outcome.report.warnings.is_empty());
    assert!(outcome.report.pipelines_found.is_empty());
}

#[tokio::test]
async fn test_audio_reference_attached() {
    let files = classify(&[
        video("clip.mp4"),
        InputFile::from_bytes("mix.wav", Some("audio/wav"), vec![0u8; 8]),
    ])
    .await;

    let outcome = merger().merge(&files, None).await.unwrap();
    let audio = outcome.record.audio_file.as_ref().unwrap();
    assert_eq!(audio.filename, "mix.wav");
    assert_eq!(audio.size, 8);
}

#[tokio::test]
async fn test_probe_failure_is_a_warning() {
    let merger = AnnotationMerger::with_parts(
        IngestSettings::default(),
        DecoderSet::default(),
        Box::new(FailingProbe),
    );
    let files = classify(&[video("clip.mp4")]).await;

    let outcome = merger.merge(&files, None).await.unwrap();
    assert_eq!(outcome.record.video_info.filename, "clip.mp4");
    assert_eq!(outcome.record.video_info.frame_rate, 30.0);
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.warnings[0].contains("moov atom"));
}

#[tokio::test]
async fn test_decoder_failures_do_not_abort() {
    let files = classify(&[
        video("clip.mp4"),
        text("talk.rttm", "SPEAKER talk 1 0.00\n"),
        text("clip.vtt", TRANSCRIPT),
    ])
    .await;

    let outcome = merger().merge(&files, None).await.unwrap();
    assert!(outcome.record.speaker_diarization.is_none());
    assert!(outcome.record.speech_recognition.is_some());
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.warnings[0].starts_with("Failed to process talk.rttm"));
}

#[tokio::test]
async fn test_empty_pipeline_output_is_omitted() {
    let files = classify(&[video("clip.mp4"), text("clip.vtt", "WEBVTT\n")]).await;

    let outcome = merger().merge(&files, None).await.unwrap();
    assert!(outcome.record.speech_recognition.is_none());
    assert!(outcome.report.pipelines_found.is_empty());

    let json = serde_json::to_value(&outcome.record).unwrap();
    assert!(json.get("speech_recognition").is_none());
}

#[tokio::test]
async fn test_unknown_and_extra_bundle_warnings() {
    let files = vec![
        ClassifiedFile::new(video("clip.mp4"), FileCategory::Video, 0.95),
        ClassifiedFile::new(
            json_file("complete_results.json", bundle(1)),
            FileCategory::CompleteResults,
            0.95,
        ),
        ClassifiedFile::new(
            json_file("rerun_complete_results.json", bundle(4)),
            FileCategory::CompleteResults,
            0.95,
        ),
        ClassifiedFile::new(text("notes.txt", "hi"), FileCategory::Unknown, 0.0),
    ];

    let outcome = merger().merge(&files, None).await.unwrap();
    assert_eq!(outcome.record.person_tracking.as_ref().unwrap().len(), 1);
    assert_eq!(
        outcome.report.warnings,
        [
            "Skipped additional complete results file: rerun_complete_results.json",
            "Unknown file type: notes.txt",
        ]
    );
}

#[tokio::test]
async fn test_progress_ticks() {
    let ticks: Arc<Mutex<Vec<(String, usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = ticks.clone();
    let on_progress = move |stage: &str, completed: usize, total: usize| {
        sink.lock().unwrap().push((stage.to_string(), completed, total));
    };

    let files = classify(&[
        video("clip.mp4"),
        text("clip.vtt", TRANSCRIPT),
        json_file("complete_results.json", bundle(2)),
    ])
    .await;
    merger().merge(&files, Some(&on_progress)).await.unwrap();

    let ticks = ticks.lock().unwrap();
    assert_eq!(ticks.len(), 5);
    assert!(ticks[0].0.contains("complete_results.json"));
    assert!(ticks.iter().all(|(_, _, total)| *total == 4));
    let completed: Vec<usize> = ticks.iter().map(|(_, c, _)| *c).collect();
    assert_eq!(completed, [0, 1, 2, 3, 4]);
    assert_eq!(ticks[3].0, "Extracting video metadata");
    assert_eq!(ticks[4].0, "Complete");
}

#[tokio::test]
async fn test_record_serialization_shape() {
    let files = classify(&[video("clip.mp4"), json_file("complete_results.json", bundle(2))]).await;
    let outcome = merger().merge(&files, None).await.unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["record"]["video_info"]["width"], 1920);
    assert_eq!(json["record"]["metadata"]["format_version"], "1.0");
    assert_eq!(json["record"]["metadata"]["source"], "annotation_merge");
    assert_eq!(json["record"]["metadata"]["pipelines"][0], "person_tracking");
    assert!(json["record"].get("face_analysis").is_none());
    assert!(json["report"]["processing_time"].is_number());
}
