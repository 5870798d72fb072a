//! Annomerge Core Library
//!
//! Ingests the outputs of independent video-annotation pipelines (person
//! tracking, face analysis, speech recognition, speaker diarization, scene
//! detection, or a single complete-results bundle), classifies each file, and
//! merges them into one unified annotation record per video.
//!
//! ## Flow
//!
//! ```text
//! InputFile ─► FileClassifier ─► Vec<ClassifiedFile> ─► AnnotationMerger ─► MergeOutcome
//!                                        │
//!                                        └─► validate / summarize
//! ```

pub mod core;

pub use crate::core::ingest::{
    rank_by_confidence, summarize, validate, validate_with_threshold, AnnotationMerger,
    ClassifiedFile, FileCategory, FileClassifier, FileSummary, MergeOutcome, MergeReport,
    UnifiedAnnotationRecord, ValidationReport,
};
pub use crate::core::media::{InputFile, VideoInfo};
pub use crate::core::settings::IngestSettings;
pub use crate::core::{CoreError, CoreResult, Pipeline};
