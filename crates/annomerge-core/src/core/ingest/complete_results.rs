//! Complete-Results Extractor
//!
//! Decodes the single-bundle format that embeds several pipelines' outputs
//! together with the run configuration and timings:
//!
//! ```json
//! {
//!   "video_path": "clip.mp4",
//!   "pipeline_results": {
//!     "person": { "results": [...], "processing_time": 12.4 },
//!     "face":   { "results": [...], "processing_time": 3.1 },
//!     "scene":  { "results": [...], "processing_time": 0.8 }
//!   },
//!   "config": { ... },
//!   "start_time": "...",
//!   "total_duration": 16.9
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::decoders::PipelineRecord;
use crate::core::media::InputFile;
use crate::core::{CoreError, CoreResult, Pipeline, TimeSec};

/// Section names accepted for each embedded pipeline, in lookup order
const SECTION_KEYS: &[(Pipeline, &[&str])] = &[
    (Pipeline::PersonTracking, &["person", "person_tracking"]),
    (Pipeline::FaceAnalysis, &["face", "face_analysis", "laion_face"]),
    (Pipeline::SceneDetection, &["scene", "scene_detection"]),
];

/// Pipeline outputs and run metadata carried by a bundle
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompleteResults {
    pub person_tracking: Vec<PipelineRecord>,
    pub face_analysis: Vec<PipelineRecord>,
    pub scene_detection: Vec<PipelineRecord>,
    /// Run configuration, verbatim
    pub config: Value,
    /// Sum of every section's own `processing_time`
    pub processing_time: f64,
    pub total_duration: Option<TimeSec>,
}

impl CompleteResults {
    /// Moves the embedded pipelines out, in contribution order
    pub fn take_sections(&mut self) -> [(Pipeline, Vec<PipelineRecord>); 3] {
        [
            (Pipeline::PersonTracking, std::mem::take(&mut self.person_tracking)),
            (Pipeline::FaceAnalysis, std::mem::take(&mut self.face_analysis)),
            (Pipeline::SceneDetection, std::mem::take(&mut self.scene_detection)),
        ]
    }
}

/// Top-level bundle layout
#[derive(Debug, Deserialize)]
struct BundleDocument {
    #[serde(default)]
    pipeline_results: Map<String, Value>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    total_duration: Option<Value>,
}

/// Reads and decodes a complete-results bundle
pub async fn extract_complete_results(file: &InputFile) -> CoreResult<CompleteResults> {
    let bytes = file.read_all().await?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| CoreError::InvalidBundle(e.to_string()))?;
    complete_results_from_value(value)
}

/// Decodes an already parsed bundle
///
/// A missing pipeline section is not an error; that pipeline is just empty.
pub fn complete_results_from_value(value: Value) -> CoreResult<CompleteResults> {
    if !value.is_object() {
        return Err(CoreError::InvalidBundle(
            "top-level value is not an object".to_string(),
        ));
    }

    let document: BundleDocument =
        serde_json::from_value(value).map_err(|e| CoreError::InvalidBundle(e.to_string()))?;

    let mut results = CompleteResults {
        config: document.config,
        total_duration: document.total_duration.as_ref().and_then(Value::as_f64),
        processing_time: document
            .pipeline_results
            .values()
            .filter_map(|section| section.get("processing_time").and_then(Value::as_f64))
            .sum(),
        ..Default::default()
    };

    for (pipeline, keys) in SECTION_KEYS {
        // First alias whose section actually holds a results list
        let records = keys
            .iter()
            .find_map(|key| {
                document
                    .pipeline_results
                    .get(*key)?
                    .get("results")?
                    .as_array()
            })
            .cloned()
            .unwrap_or_default();

        match pipeline {
            Pipeline::PersonTracking => results.person_tracking = records,
            Pipeline::FaceAnalysis => results.face_analysis = records,
            Pipeline::SceneDetection => results.scene_detection = records,
            _ => {}
        }
    }

    Ok(results)
}

// =============================================================================
// Tests
// =============================================================================
