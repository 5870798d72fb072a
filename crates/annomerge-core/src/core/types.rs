//! Annomerge Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};

// =============================================================================
// Scalar Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Heuristic classification score in `[0.0, 1.0]`
///
/// Only used for ranking and for surfacing doubtful classifications,
/// never as a probability.
pub type Confidence = f64;

// =============================================================================
// Pipelines
// =============================================================================

/// An annotation pipeline whose output can be merged into a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    /// COCO-style per-frame person boxes and keypoints
    PersonTracking,
    /// WebVTT transcript cues
    SpeechRecognition,
    /// RTTM speaker segments
    SpeakerDiarization,
    /// Scene boundary records
    SceneDetection,
    /// LAION-style face records
    FaceAnalysis,
}

impl Pipeline {
    /// Returns all pipelines in record field order
    pub fn all() -> [Pipeline; 5] {
        [
            Pipeline::PersonTracking,
            Pipeline::SpeechRecognition,
            Pipeline::SpeakerDiarization,
            Pipeline::SceneDetection,
            Pipeline::FaceAnalysis,
        ]
    }

    /// Returns the wire name used in record keys and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::PersonTracking => "person_tracking",
            Pipeline::SpeechRecognition => "speech_recognition",
            Pipeline::SpeakerDiarization => "speaker_diarization",
            Pipeline::SceneDetection => "scene_detection",
            Pipeline::FaceAnalysis => "face_analysis",
        }
    }

    /// Returns true if a complete-results bundle can carry this pipeline
    pub fn is_bundled(&self) -> bool {
        matches!(
            self,
            Pipeline::PersonTracking | Pipeline::SceneDetection | Pipeline::FaceAnalysis
        )
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
