//! Merge Engine
//!
//! Assembles one [`UnifiedAnnotationRecord`] from a classified file set.
//!
//! Processing is strictly sequential. Precedence depends on order:
//! - a complete-results bundle is processed first and owns the person,
//!   face and scene slots it fills
//! - a later file for an already filled slot is skipped without a warning
//! - the last video (and audio) file in input order wins
//!
//! Per-file failures become warnings; only a missing video aborts the merge.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::decoders::{DecoderSet, PipelineRecord, SpeakerSegment, SpeechCue};
use crate::core::media::{FfprobeVideoProbe, InputFile, VideoInfo, VideoProbe};
use crate::core::settings::IngestSettings;
use crate::core::{CoreError, CoreResult, Pipeline, TimeSec};

use super::complete_results::{extract_complete_results, CompleteResults};
use super::{
    AudioFileRef, ClassifiedFile, FileCategory, MergeOutcome, MergeReport, RecordMetadata,
    UnifiedAnnotationRecord,
};

/// Progress callback: `(stage label, completed steps, total steps)`
pub type ProgressFn = dyn Fn(&str, usize, usize) + Send + Sync;

// =============================================================================
// Accumulator
// =============================================================================

/// Run metadata carried over from a complete-results bundle
#[derive(Debug, Default)]
struct CarriedMetadata {
    processing_config: serde_json::Value,
    processing_time: f64,
    total_duration: Option<TimeSec>,
}

/// Mutable state of one merge, owned by that merge alone
#[derive(Debug, Default)]
struct MergeAccumulator {
    person_tracking: Vec<PipelineRecord>,
    face_analysis: Vec<PipelineRecord>,
    scene_detection: Vec<PipelineRecord>,
    speech_recognition: Vec<SpeechCue>,
    speaker_diarization: Vec<SpeakerSegment>,
    pipelines_found: Vec<Pipeline>,
    warnings: Vec<String>,
    video: Option<InputFile>,
    audio: Option<InputFile>,
    carried: Option<CarriedMetadata>,
    files_processed: usize,
}

impl MergeAccumulator {
    fn record_pipeline(&mut self, pipeline: Pipeline) {
        if !self.pipelines_found.contains(&pipeline) {
            self.pipelines_found.push(pipeline);
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn slot_filled(&self, pipeline: Pipeline) -> bool {
        match pipeline {
            Pipeline::PersonTracking => !self.person_tracking.is_empty(),
            Pipeline::FaceAnalysis => !self.face_analysis.is_empty(),
            Pipeline::SceneDetection => !self.scene_detection.is_empty(),
            Pipeline::SpeechRecognition => !self.speech_recognition.is_empty(),
            Pipeline::SpeakerDiarization => !self.speaker_diarization.is_empty(),
        }
    }

    /// Stores JSON records for a bundled pipeline; empty input leaves the slot empty
    fn fill_json_slot(&mut self, pipeline: Pipeline, records: Vec<PipelineRecord>) {
        if records.is_empty() || !pipeline.is_bundled() {
            return;
        }
        match pipeline {
            Pipeline::PersonTracking => self.person_tracking = records,
            Pipeline::FaceAnalysis => self.face_analysis = records,
            _ => self.scene_detection = records,
        }
        self.record_pipeline(pipeline);
    }

    fn absorb_bundle(&mut self, mut bundle: CompleteResults) {
        for (pipeline, records) in bundle.take_sections() {
            self.fill_json_slot(pipeline, records);
        }

        self.carried = Some(CarriedMetadata {
            processing_config: bundle.config,
            processing_time: bundle.processing_time,
            total_duration: bundle.total_duration,
        });
    }
}

/// Emits progress ticks to an optional callback
struct ProgressReporter<'a> {
    callback: Option<&'a ProgressFn>,
    total: usize,
}

impl ProgressReporter<'_> {
    fn tick(&self, stage: &str, completed: usize) {
        debug!(stage, completed, total = self.total, "Merge progress");
        if let Some(callback) = self.callback {
            callback(stage, completed, self.total);
        }
    }
}

// =============================================================================
// Merger
// =============================================================================

/// Merges classified files into a unified annotation record
pub struct AnnotationMerger {
    settings: IngestSettings,
    decoders: DecoderSet,
    probe: Box<dyn VideoProbe>,
}

impl AnnotationMerger {
    /// Creates a merger with the default decoders and an FFprobe-backed probe
    pub fn new(settings: IngestSettings) -> Self {
        let probe = FfprobeVideoProbe::new(&settings.ffprobe_path, settings.default_frame_rate);
        Self {
            settings,
            decoders: DecoderSet::default(),
            probe: Box::new(probe),
        }
    }

    /// Creates a merger with custom decoders and probe
    pub fn with_parts(
        settings: IngestSettings,
        decoders: DecoderSet,
        probe: Box<dyn VideoProbe>,
    ) -> Self {
        Self {
            settings,
            decoders,
            probe,
        }
    }

    /// Merges the classified files
    ///
    /// Files are processed in the given order, after any complete-results
    /// bundle. Returns [`CoreError::MissingVideo`] if no video file was
    /// supplied; every other per-file problem is reported as a warning.
    pub async fn merge(
        &self,
        files: &[ClassifiedFile],
        on_progress: Option<&ProgressFn>,
    ) -> CoreResult<MergeOutcome> {
        let started = Instant::now();
        let progress = ProgressReporter {
            callback: on_progress,
            // One extra step for reading the video metadata
            total: files.len() + 1,
        };
        info!(files = files.len(), "Starting annotation merge");

        let mut acc = MergeAccumulator::default();

        let bundle_index = files
            .iter()
            .position(|f| f.category == FileCategory::CompleteResults);
        if let Some(index) = bundle_index {
            let bundle = &files[index];
            progress.tick(
                &format!("Processing complete results: {}", bundle.name()),
                acc.files_processed,
            );
            match extract_complete_results(&bundle.file).await {
                Ok(results) => acc.absorb_bundle(results),
                Err(e) => acc.warn(format!("Failed to process {}: {}", bundle.name(), e)),
            }
            acc.files_processed += 1;
        }

        for (index, classified) in files.iter().enumerate() {
            if Some(index) == bundle_index {
                continue;
            }
            progress.tick(
                &format!("Processing {}", classified.name()),
                acc.files_processed,
            );
            self.process_file(&mut acc, classified).await;
            acc.files_processed += 1;
        }

        let Some(video) = acc.video.take() else {
            warn!("Merge aborted: no video file among inputs");
            return Err(CoreError::MissingVideo);
        };

        progress.tick("Extracting video metadata", acc.files_processed);
        let video_info = match self.probe.probe(&video).await {
            Ok(info) => info,
            Err(e) => {
                acc.warn(format!(
                    "Failed to read video metadata for {}: {}",
                    video.name(),
                    e
                ));
                VideoInfo::unprobed(video.name(), self.settings.default_frame_rate)
            }
        };

        let outcome = self.assemble(acc, video_info, started);
        progress.tick("Complete", progress.total);

        info!(
            files = outcome.report.files_processed,
            pipelines = ?outcome.report.pipelines_found,
            warnings = outcome.report.warnings.len(),
            "Annotation merge finished"
        );
        Ok(outcome)
    }

    async fn process_file(&self, acc: &mut MergeAccumulator, classified: &ClassifiedFile) {
        let file = &classified.file;
        match classified.category {
            FileCategory::Video => {
                if let Some(previous) = &acc.video {
                    debug!(previous = %previous.name(), file = %file.name(), "Replacing video source");
                }
                acc.video = Some(file.clone());
            }
            FileCategory::Audio => {
                acc.audio = Some(file.clone());
            }
            FileCategory::PersonTracking
            | FileCategory::FaceAnalysis
            | FileCategory::SceneDetection => {
                let Some(pipeline) = classified.category.pipeline() else {
                    return;
                };
                if acc.slot_filled(pipeline) {
                    debug!(file = %file.name(), %pipeline, "Pipeline already supplied, skipping");
                    return;
                }
                let decoder = match pipeline {
                    Pipeline::PersonTracking => &self.decoders.person_tracking,
                    Pipeline::FaceAnalysis => &self.decoders.face_analysis,
                    _ => &self.decoders.scene_detection,
                };
                match decoder.decode(file).await {
                    Ok(records) => acc.fill_json_slot(pipeline, records),
                    Err(e) => acc.warn(format!("Failed to process {}: {}", file.name(), e)),
                }
            }
            FileCategory::SpeechRecognition => {
                match self.decoders.speech_recognition.decode(file).await {
                    Ok(cues) if cues.is_empty() => {
                        debug!(file = %file.name(), "Transcript has no cues");
                    }
                    Ok(cues) => {
                        acc.speech_recognition = cues;
                        acc.record_pipeline(Pipeline::SpeechRecognition);
                    }
                    Err(e) => acc.warn(format!("Failed to process {}: {}", file.name(), e)),
                }
            }
            FileCategory::SpeakerDiarization => {
                match self.decoders.speaker_diarization.decode(file).await {
                    Ok(segments) if segments.is_empty() => {
                        debug!(file = %file.name(), "Diarization has no segments");
                    }
                    Ok(segments) => {
                        acc.speaker_diarization = segments;
                        acc.record_pipeline(Pipeline::SpeakerDiarization);
                    }
                    Err(e) => acc.warn(format!("Failed to process {}: {}", file.name(), e)),
                }
            }
            FileCategory::CompleteResults => {
                acc.warn(format!(
                    "Skipped additional complete results file: {}",
                    file.name()
                ));
            }
            FileCategory::Unknown => {
                acc.warn(format!("Unknown file type: {}", file.name()));
            }
        }
    }

    fn assemble(
        &self,
        acc: MergeAccumulator,
        video_info: VideoInfo,
        started: Instant,
    ) -> MergeOutcome {
        let carried = acc.carried;
        let metadata = RecordMetadata {
            created_at: chrono::Utc::now().to_rfc3339(),
            format_version: self.settings.format_version.clone(),
            pipelines: acc.pipelines_found.clone(),
            source: self.settings.source_tag.clone(),
            processing_config: carried.as_ref().map(|c| c.processing_config.clone()),
            processing_time: carried.as_ref().map(|c| c.processing_time),
            total_duration: carried.as_ref().and_then(|c| c.total_duration),
        };

        let record = UnifiedAnnotationRecord {
            video_info,
            metadata,
            person_tracking: non_empty(acc.person_tracking),
            speech_recognition: non_empty(acc.speech_recognition),
            speaker_diarization: non_empty(acc.speaker_diarization),
            scene_detection: non_empty(acc.scene_detection),
            face_analysis: non_empty(acc.face_analysis),
            audio_file: acc.audio.as_ref().map(AudioFileRef::from),
        };

        let report = MergeReport {
            files_processed: acc.files_processed,
            pipelines_found: acc.pipelines_found,
            warnings: acc.warnings,
            processing_time: started.elapsed(),
        };

        MergeOutcome { record, report }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

impl std::fmt::Debug for AnnotationMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationMerger")
            .field("settings", &self.settings)
            .field("decoders", &self.decoders)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
