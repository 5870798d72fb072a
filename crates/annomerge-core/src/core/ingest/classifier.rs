//! File Classifier
//!
//! Decides what each uploaded file represents from its extension, MIME type,
//! name and a bounded content prefix. Every decision carries a heuristic
//! confidence so doubtful guesses can be shown to the user instead of being
//! silently accepted or dropped.

use std::cmp::Ordering;

use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use crate::core::media::InputFile;
use crate::core::settings::IngestSettings;
use crate::core::Confidence;

use super::sniffers;
use super::{ClassifiedFile, FileCategory};

// =============================================================================
// Extension Tables
// =============================================================================

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "ogg", "flac", "m4a", "wma"];

// =============================================================================
// JSON Rules
// =============================================================================

/// A content check on the parsed JSON prefix
struct ContentRule {
    category: FileCategory,
    confidence: Confidence,
    matches: fn(&Value) -> bool,
}

/// Evaluated in order; the first match wins
const CONTENT_RULES: &[ContentRule] = &[
    ContentRule {
        category: FileCategory::FaceAnalysis,
        confidence: 0.8,
        matches: sniffers::is_face_analysis,
    },
    ContentRule {
        category: FileCategory::PersonTracking,
        confidence: 0.8,
        matches: sniffers::is_person_tracking,
    },
    ContentRule {
        category: FileCategory::SceneDetection,
        confidence: 0.8,
        matches: sniffers::is_scene_detection,
    },
];

/// A file-name fallback once the content checks found nothing
struct NameRule {
    category: FileCategory,
    confidence: Confidence,
    needles: &'static [&'static str],
}

/// Evaluated in order; the first match wins
const NAME_RULES: &[NameRule] = &[
    NameRule {
        category: FileCategory::CompleteResults,
        confidence: 0.7,
        needles: &["complete_results"],
    },
    NameRule {
        category: FileCategory::FaceAnalysis,
        confidence: 0.6,
        needles: &["face_annotations", "laion_face"],
    },
    NameRule {
        category: FileCategory::PersonTracking,
        confidence: 0.5,
        needles: &["person", "tracking"],
    },
    NameRule {
        category: FileCategory::SceneDetection,
        confidence: 0.5,
        needles: &["scene"],
    },
];

// =============================================================================
// Classifier
// =============================================================================

/// Classifies input files
#[derive(Clone, Debug, Default)]
pub struct FileClassifier {
    settings: IngestSettings,
}

impl FileClassifier {
    /// Creates a classifier with the given settings
    pub fn new(settings: IngestSettings) -> Self {
        Self { settings }
    }

    /// Classifies a single file
    ///
    /// Never fails: unreadable or unparsable content lowers the confidence
    /// instead.
    pub async fn classify(&self, file: &InputFile) -> ClassifiedFile {
        let (category, confidence) = self.detect(file).await;
        debug!(
            file = %file.name(),
            category = %category,
            confidence,
            "Classified file"
        );
        ClassifiedFile::new(file.clone(), category, confidence)
    }

    /// Classifies every file concurrently, highest confidence first
    ///
    /// Files with equal confidence keep their input order.
    pub async fn classify_all(&self, files: &[InputFile]) -> Vec<ClassifiedFile> {
        let classified = join_all(files.iter().map(|file| self.classify(file))).await;
        rank_by_confidence(classified)
    }

    async fn detect(&self, file: &InputFile) -> (FileCategory, Confidence) {
        let extension = file.extension().unwrap_or_default();
        let mime = file.mime_type().unwrap_or_default().to_ascii_lowercase();
        let name = file.name().to_lowercase();

        if VIDEO_EXTENSIONS.contains(&extension.as_str()) || mime.starts_with("video/") {
            return (FileCategory::Video, 0.95);
        }
        if AUDIO_EXTENSIONS.contains(&extension.as_str()) || mime.starts_with("audio/") {
            return (FileCategory::Audio, 0.95);
        }

        if extension == "vtt" || name.contains("speech_recognition") {
            let prefix = self.text_prefix(file, self.settings.webvtt_prefix_bytes).await;
            let confidence = if sniffers::is_webvtt(&prefix) { 0.9 } else { 0.3 };
            return (FileCategory::SpeechRecognition, confidence);
        }

        if extension == "rttm" || name.contains("speaker_diarization") {
            let prefix = self.text_prefix(file, self.settings.rttm_prefix_bytes).await;
            let confidence = if sniffers::is_rttm(&prefix) { 0.9 } else { 0.3 };
            return (FileCategory::SpeakerDiarization, confidence);
        }

        if extension == "json" || mime == "application/json" {
            return self.detect_json(file, &name).await;
        }

        (FileCategory::Unknown, 0.0)
    }

    async fn detect_json(&self, file: &InputFile, name: &str) -> (FileCategory, Confidence) {
        let bytes = match file.read_all().await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(file = %file.name(), error = %e, "Unreadable JSON candidate");
                return (FileCategory::Unknown, 0.0);
            }
        };

        // The bundle check sees the whole document so a large bundle is never
        // judged by a prefix that happens to look like another format.
        let whole: Option<Value> = serde_json::from_slice(&bytes).ok();
        if whole.as_ref().is_some_and(sniffers::is_complete_results) {
            return (FileCategory::CompleteResults, 0.95);
        }

        let limit = self.settings.json_prefix_bytes;
        let prefix = if bytes.len() <= limit {
            whole
        } else {
            serde_json::from_str(&String::from_utf8_lossy(&bytes[..limit])).ok()
        };
        let Some(prefix) = prefix else {
            return (FileCategory::Unknown, 0.0);
        };

        if let Some(rule) = CONTENT_RULES.iter().find(|rule| (rule.matches)(&prefix)) {
            return (rule.category, rule.confidence);
        }

        if let Some(rule) = NAME_RULES
            .iter()
            .find(|rule| rule.needles.iter().any(|needle| name.contains(needle)))
        {
            return (rule.category, rule.confidence);
        }

        // Valid JSON of an unrecognized shape
        (FileCategory::Unknown, 0.2)
    }

    async fn text_prefix(&self, file: &InputFile, limit: usize) -> String {
        file.read_text_prefix(limit).await.unwrap_or_else(|e| {
            debug!(file = %file.name(), error = %e, "Unreadable text candidate");
            String::new()
        })
    }
}

/// Stable sort by descending confidence
pub fn rank_by_confidence(mut files: Vec<ClassifiedFile>) -> Vec<ClassifiedFile> {
    files.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    files
}

// =============================================================================
// Tests
// =============================================================================
