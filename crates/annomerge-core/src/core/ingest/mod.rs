//! Annotation Ingest
//!
//! Classifies uploaded pipeline outputs and merges them into one unified
//! annotation record per video.
//!
//! - **sniffers.rs**: bounded-prefix content predicates
//! - **classifier.rs**: `(category, pipeline, confidence)` for each file
//! - **complete_results.rs**: single-bundle extractor
//! - **merger.rs**: precedence rules, decoding, diagnostics, progress
//! - **review.rs**: completeness checks and grouped summaries

pub mod classifier;
pub mod complete_results;
pub mod merger;
pub mod models;
pub mod review;
pub mod sniffers;

pub use classifier::{rank_by_confidence, FileClassifier};
pub use complete_results::{extract_complete_results, CompleteResults};
pub use merger::{AnnotationMerger, ProgressFn};
pub use models::*;
pub use review::{
    summarize, validate, validate_with_threshold, FileSummary, LowConfidenceFile, MissingItem,
    PipelineEntry, ValidationReport,
};
