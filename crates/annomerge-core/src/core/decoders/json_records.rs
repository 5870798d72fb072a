//! JSON Record Decoder
//!
//! Person-tracking, face-analysis and scene-detection outputs are JSON lists
//! of per-frame or per-segment objects, either at the top level or wrapped in
//! an object under a well-known key. Records are kept as generic JSON values;
//! their schemas belong to the producing pipelines.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::media::InputFile;
use crate::core::{CoreError, CoreResult, Pipeline};

use super::Decoder;

/// A single pipeline record, schema owned by the producer
pub type PipelineRecord = Value;

/// Decodes a JSON list of records for one pipeline
#[derive(Clone, Debug)]
pub struct JsonRecordDecoder {
    pipeline: Pipeline,
    wrapper_keys: &'static [&'static str],
}

impl JsonRecordDecoder {
    /// COCO-style person tracking
    pub fn person_tracking() -> Self {
        Self {
            pipeline: Pipeline::PersonTracking,
            wrapper_keys: &["annotations", "results"],
        }
    }

    /// LAION-style face analysis
    pub fn face_analysis() -> Self {
        Self {
            pipeline: Pipeline::FaceAnalysis,
            wrapper_keys: &["annotations", "results"],
        }
    }

    /// Scene boundaries
    pub fn scene_detection() -> Self {
        Self {
            pipeline: Pipeline::SceneDetection,
            wrapper_keys: &["scenes", "results", "annotations"],
        }
    }

    /// Extracts the record list from an already parsed document
    pub fn records_from_value(&self, value: Value) -> CoreResult<Vec<PipelineRecord>> {
        let format = self.pipeline.as_str();
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => self
                .wrapper_keys
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    CoreError::decode(
                        format,
                        format!("expected a list under one of {:?}", self.wrapper_keys),
                    )
                })?,
            _ => return Err(CoreError::decode(format, "expected a JSON list or object")),
        };

        if let Some(index) = items.iter().position(|item| !item.is_object()) {
            return Err(CoreError::decode(
                format,
                format!("record {} is not an object", index),
            ));
        }

        Ok(items)
    }
}

#[async_trait]
impl Decoder for JsonRecordDecoder {
    type Record = PipelineRecord;

    async fn decode(&self, file: &InputFile) -> CoreResult<Vec<PipelineRecord>> {
        let bytes = file.read_all().await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::decode(self.pipeline.as_str(), e.to_string()))?;
        self.records_from_value(value)
    }
}

// =============================================================================
// Tests
// =============================================================================
