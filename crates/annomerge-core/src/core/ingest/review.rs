//! Validation and Summary Views
//!
//! Read-only views over a classified file set, used to show the user what
//! is missing and how each file was understood before merging.

use serde::Serialize;

use crate::core::settings::IngestSettings;
use crate::core::Confidence;

use super::{ClassifiedFile, FileCategory};

// =============================================================================
// Validation
// =============================================================================

/// Something the file set needs before it can be merged
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MissingItem {
    pub item: String,
    pub suggestion: String,
}

/// A classification the user should confirm
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LowConfidenceFile {
    pub filename: String,
    pub category: FileCategory,
    pub confidence: Confidence,
}

/// Completeness of a classified file set
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing: Vec<MissingItem>,
    pub low_confidence: Vec<LowConfidenceFile>,
}

/// Checks that the set holds a video and at least one annotation source
///
/// Uses the default `lowConfidenceThreshold` from [`IngestSettings`].
pub fn validate(files: &[ClassifiedFile]) -> ValidationReport {
    validate_with_threshold(files, IngestSettings::default().low_confidence_threshold)
}

/// [`validate`] with a custom low-confidence threshold
pub fn validate_with_threshold(files: &[ClassifiedFile], threshold: Confidence) -> ValidationReport {
    let mut missing = Vec::new();

    if !files.iter().any(|f| f.category == FileCategory::Video) {
        missing.push(MissingItem {
            item: "video file".to_string(),
            suggestion: "Add the source video (e.g. .mp4, .mov, .webm) the annotations belong to"
                .to_string(),
        });
    }

    if !files.iter().any(|f| f.category.carries_pipeline_data()) {
        missing.push(MissingItem {
            item: "pipeline data".to_string(),
            suggestion: "Add at least one annotation file: person tracking, face analysis or \
                         scene detection JSON, a WebVTT transcript, an RTTM diarization file, \
                         or a complete_results.json bundle"
                .to_string(),
        });
    }

    let low_confidence = files
        .iter()
        .filter(|f| f.category != FileCategory::Unknown && f.confidence < threshold)
        .map(|f| LowConfidenceFile {
            filename: f.name().to_string(),
            category: f.category,
            confidence: f.confidence,
        })
        .collect();

    ValidationReport {
        is_valid: missing.is_empty(),
        missing,
        low_confidence,
    }
}

// =============================================================================
// Summary
// =============================================================================

/// One annotation-bearing file in a summary
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineEntry {
    pub pipeline: String,
    pub filename: String,
    pub confidence: Confidence,
}

/// Classified files grouped for display
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FileSummary {
    /// Video that a merge would use
    pub video: Option<String>,
    /// Audio that a merge would use
    pub audio: Option<String>,
    pub pipelines: Vec<PipelineEntry>,
    pub unknown: Vec<String>,
}

/// Groups classified files by role
///
/// Video and audio follow the merge rule: the last one listed wins.
pub fn summarize(files: &[ClassifiedFile]) -> FileSummary {
    let mut summary = FileSummary::default();

    for file in files {
        match file.category {
            FileCategory::Video => summary.video = Some(file.name().to_string()),
            FileCategory::Audio => summary.audio = Some(file.name().to_string()),
            FileCategory::Unknown => summary.unknown.push(file.name().to_string()),
            category => summary.pipelines.push(PipelineEntry {
                pipeline: file
                    .pipeline
                    .clone()
                    .unwrap_or_else(|| category.as_str().to_string()),
                filename: file.name().to_string(),
                confidence: file.confidence,
            }),
        }
    }

    summary
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::InputFile;

    fn classified(name: &str, category: FileCategory, confidence: Confidence) -> ClassifiedFile {
        ClassifiedFile::new(InputFile::from_bytes(name, None, Vec::new()), category, confidence)
    }

    // -------------------------------------------------------------------------
    // Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_complete_set() {
        let files = vec![
            classified("clip.mp4", FileCategory::Video, 0.95),
            classified("clip.vtt", FileCategory::SpeechRecognition, 0.9),
        ];
        let report = validate(&files);
        assert!(report.is_valid);
        assert!(report.missing.is_empty());
        assert!(report.low_confidence.is_empty());
    }

    #[test]
    fn test_validate_empty_set() {
        let report = validate(&[]);
        assert!(!report.is_valid);
        let items: Vec<&str> = report.missing.iter().map(|m| m.item.as_str()).collect();
        assert_eq!(items, ["video file", "pipeline data"]);
        assert!(report.missing.iter().all(|m| !m.suggestion.is_empty()));
    }

    #[test]
    fn test_validate_bundle_counts_as_pipeline_data() {
        let files = vec![
            classified("clip.mp4", FileCategory::Video, 0.95),
            classified("complete_results.json", FileCategory::CompleteResults, 0.95),
        ];
        assert!(validate(&files).is_valid);
    }

    #[test]
    fn test_validate_audio_and_unknown_are_not_pipeline_data() {
        let files = vec![
            classified("clip.mp4", FileCategory::Video, 0.95),
            classified("track.wav", FileCategory::Audio, 0.95),
            classified("notes.txt", FileCategory::Unknown, 0.0),
        ];
        let report = validate(&files);
        assert!(!report.is_valid);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].item, "pipeline data");
    }

    #[test]
    fn test_validate_flags_low_confidence() {
        let files = vec![
            classified("clip.mp4", FileCategory::Video, 0.95),
            classified("odd.vtt", FileCategory::SpeechRecognition, 0.3),
            classified("mystery.json", FileCategory::Unknown, 0.2),
        ];
        let report = validate(&files);
        assert!(report.is_valid);
        assert_eq!(report.low_confidence.len(), 1);
        assert_eq!(report.low_confidence[0].filename, "odd.vtt");

        let strict = validate_with_threshold(&files, 0.96);
        assert_eq!(strict.low_confidence.len(), 2);
    }

    #[test]
    fn test_validate_uses_settings_threshold() {
        let threshold = IngestSettings::default().low_confidence_threshold;
        let files = vec![
            classified("clip.mp4", FileCategory::Video, 0.95),
            classified("talk.rttm", FileCategory::SpeakerDiarization, threshold - 0.01),
            classified("people.json", FileCategory::PersonTracking, threshold),
        ];
        let report = validate(&files);
        assert_eq!(report, validate_with_threshold(&files, threshold));
        assert_eq!(report.low_confidence.len(), 1);
        assert_eq!(report.low_confidence[0].filename, "talk.rttm");
    }

    // -------------------------------------------------------------------------
    // Summary Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_summarize_groups_files() {
        let files = vec![
            classified("a.mp4", FileCategory::Video, 0.95),
            classified("tracks.json", FileCategory::PersonTracking, 0.8),
            classified("voice.wav", FileCategory::Audio, 0.95),
            classified("b.mp4", FileCategory::Video, 0.95),
            classified("notes.txt", FileCategory::Unknown, 0.0),
            classified("complete_results.json", FileCategory::CompleteResults, 0.95),
        ];

        let summary = summarize(&files);
        assert_eq!(summary.video.as_deref(), Some("b.mp4"));
        assert_eq!(summary.audio.as_deref(), Some("voice.wav"));
        assert_eq!(summary.unknown, ["notes.txt"]);
        assert_eq!(
            summary.pipelines,
            [
                PipelineEntry {
                    pipeline: "person_tracking".to_string(),
                    filename: "tracks.json".to_string(),
                    confidence: 0.8,
                },
                PipelineEntry {
                    pipeline: "complete_results".to_string(),
                    filename: "complete_results.json".to_string(),
                    confidence: 0.95,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_does_not_mutate_input() {
        let files = vec![classified("x.rttm", FileCategory::SpeakerDiarization, 0.9)];
        let before = serde_json::to_value(&files).unwrap();
        let _ = summarize(&files);
        let _ = validate(&files);
        assert_eq!(serde_json::to_value(&files).unwrap(), before);
    }
}
