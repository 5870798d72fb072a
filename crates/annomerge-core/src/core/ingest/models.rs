//! Ingest Data Models
//!
//! Classified files, the unified annotation record and the merge report.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::core::decoders::{PipelineRecord, SpeakerSegment, SpeechCue};
use crate::core::media::{InputFile, VideoInfo};
use crate::core::{Confidence, Pipeline, TimeSec};

// =============================================================================
// File Category
// =============================================================================

/// What an uploaded file was recognized as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Video,
    Audio,
    PersonTracking,
    SpeechRecognition,
    SpeakerDiarization,
    SceneDetection,
    FaceAnalysis,
    CompleteResults,
    Unknown,
}

impl FileCategory {
    /// Returns the wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::PersonTracking => "person_tracking",
            FileCategory::SpeechRecognition => "speech_recognition",
            FileCategory::SpeakerDiarization => "speaker_diarization",
            FileCategory::SceneDetection => "scene_detection",
            FileCategory::FaceAnalysis => "face_analysis",
            FileCategory::CompleteResults => "complete_results",
            FileCategory::Unknown => "unknown",
        }
    }

    /// Returns the single pipeline this category feeds, if any
    pub fn pipeline(&self) -> Option<Pipeline> {
        match self {
            FileCategory::PersonTracking => Some(Pipeline::PersonTracking),
            FileCategory::SpeechRecognition => Some(Pipeline::SpeechRecognition),
            FileCategory::SpeakerDiarization => Some(Pipeline::SpeakerDiarization),
            FileCategory::SceneDetection => Some(Pipeline::SceneDetection),
            FileCategory::FaceAnalysis => Some(Pipeline::FaceAnalysis),
            _ => None,
        }
    }

    /// Returns true if files of this category carry annotation data
    pub fn carries_pipeline_data(&self) -> bool {
        self.pipeline().is_some() || *self == FileCategory::CompleteResults
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Classified File
// =============================================================================

/// An input file together with its classification
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedFile {
    pub file: InputFile,
    pub category: FileCategory,
    /// Pipeline label for annotation-bearing categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    pub confidence: Confidence,
}

impl ClassifiedFile {
    /// Creates a classification, deriving the pipeline label from the category
    pub fn new(file: InputFile, category: FileCategory, confidence: Confidence) -> Self {
        let pipeline = category
            .carries_pipeline_data()
            .then(|| category.as_str().to_string());
        Self {
            file,
            category,
            pipeline,
            confidence,
        }
    }

    /// Returns the file name
    pub fn name(&self) -> &str {
        self.file.name()
    }
}

// =============================================================================
// Unified Annotation Record
// =============================================================================

/// Reference to the separate audio track, when one was uploaded
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AudioFileRef {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub size: u64,
}

impl From<&InputFile> for AudioFileRef {
    fn from(file: &InputFile) -> Self {
        Self {
            filename: file.name().to_string(),
            mime_type: file.mime_type().map(str::to_string),
            size: file.size(),
        }
    }
}

/// Provenance of a unified record
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordMetadata {
    /// RFC 3339 creation timestamp
    pub created_at: String,
    pub format_version: String,
    /// Pipelines in discovery order, bundle contributions first
    pub pipelines: Vec<Pipeline>,
    pub source: String,
    /// Run configuration carried over from a complete-results bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_config: Option<serde_json::Value>,
    /// Sum of the bundle's per-pipeline processing times
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<TimeSec>,
}

/// All annotations known for one video
///
/// A pipeline key is present only when that pipeline produced at least one
/// record; an absent key means the pipeline did not run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnifiedAnnotationRecord {
    pub video_info: VideoInfo,
    pub metadata: RecordMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_tracking: Option<Vec<PipelineRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_recognition: Option<Vec<SpeechCue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_diarization: Option<Vec<SpeakerSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_detection: Option<Vec<PipelineRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_analysis: Option<Vec<PipelineRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<AudioFileRef>,
}

impl UnifiedAnnotationRecord {
    /// Returns true if the record holds data for the pipeline
    pub fn has_pipeline(&self, pipeline: Pipeline) -> bool {
        match pipeline {
            Pipeline::PersonTracking => self.person_tracking.is_some(),
            Pipeline::SpeechRecognition => self.speech_recognition.is_some(),
            Pipeline::SpeakerDiarization => self.speaker_diarization.is_some(),
            Pipeline::SceneDetection => self.scene_detection.is_some(),
            Pipeline::FaceAnalysis => self.face_analysis.is_some(),
        }
    }
}

// =============================================================================
// Merge Report
// =============================================================================

/// Diagnostics accompanying every successful merge
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeReport {
    pub files_processed: usize,
    pub pipelines_found: Vec<Pipeline>,
    /// One entry per skipped or failed file
    pub warnings: Vec<String>,
    /// Wall-clock time of the merge, serialized in seconds
    #[serde(serialize_with = "serialize_secs")]
    pub processing_time: Duration,
}

impl MergeReport {
    /// Returns true if any file was skipped or failed
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Result of a successful merge
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub record: UnifiedAnnotationRecord,
    pub report: MergeReport,
}

// =============================================================================
// Tests
// =============================================================================
