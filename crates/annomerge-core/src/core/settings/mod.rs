//! Ingest Settings
//!
//! Tunable limits and tags for classification and merging.
//! Loaded from an optional JSON file; every field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tracing::info;

use crate::core::{CoreError, CoreResult};

/// Settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Ingest settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestSettings {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Bytes inspected by the WebVTT sniffer
    #[serde(default = "default_webvtt_prefix")]
    pub webvtt_prefix_bytes: usize,

    /// Bytes inspected by the RTTM sniffer
    #[serde(default = "default_rttm_prefix")]
    pub rttm_prefix_bytes: usize,

    /// Bytes parsed for JSON sub-type sniffing
    #[serde(default = "default_json_prefix")]
    pub json_prefix_bytes: usize,

    /// Frame rate used when the container does not report one
    #[serde(default = "default_frame_rate")]
    pub default_frame_rate: f64,

    /// FFprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Classifications below this score are flagged for review
    #[serde(default = "default_low_confidence")]
    pub low_confidence_threshold: f64,

    /// Format version written into record metadata
    #[serde(default = "default_format_version")]
    pub format_version: String,

    /// Source tag written into record metadata
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_webvtt_prefix() -> usize {
    100
}

fn default_rttm_prefix() -> usize {
    1000
}

fn default_json_prefix() -> usize {
    2000
}

fn default_frame_rate() -> f64 {
    30.0
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_low_confidence() -> f64 {
    0.5
}

fn default_format_version() -> String {
    "1.0".to_string()
}

fn default_source_tag() -> String {
    "annotation_merge".to_string()
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            webvtt_prefix_bytes: default_webvtt_prefix(),
            rttm_prefix_bytes: default_rttm_prefix(),
            json_prefix_bytes: default_json_prefix(),
            default_frame_rate: default_frame_rate(),
            ffprobe_path: default_ffprobe_path(),
            low_confidence_threshold: default_low_confidence(),
            format_version: default_format_version(),
            source_tag: default_source_tag(),
        }
    }
}

impl IngestSettings {
    /// Loads settings from a JSON file
    ///
    /// A missing file yields defaults. Malformed JSON is an error.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut settings = serde_json::from_str::<IngestSettings>(&content).map_err(|e| {
            CoreError::InvalidSettings(format!("{}: {}", path.display(), e))
        })?;
        settings.normalize();
        Ok(settings)
    }

    /// Clamp out-of-range values back to usable ones
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.webvtt_prefix_bytes = self.webvtt_prefix_bytes.max(1);
        self.rttm_prefix_bytes = self.rttm_prefix_bytes.max(1);
        self.json_prefix_bytes = self.json_prefix_bytes.max(1);

        if !self.default_frame_rate.is_finite() || self.default_frame_rate <= 0.0 {
            self.default_frame_rate = default_frame_rate();
        }

        self.low_confidence_threshold = clamp_f64(self.low_confidence_threshold, 0.0, 1.0);

        if self.ffprobe_path.trim().is_empty() {
            self.ffprobe_path = default_ffprobe_path();
        }
        if self.format_version.trim().is_empty() {
            self.format_version = default_format_version();
        }
        if self.source_tag.trim().is_empty() {
            self.source_tag = default_source_tag();
        }
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

// =============================================================================
// Tests
// =============================================================================
