//! Pipeline Output Decoders
//!
//! Each decoder turns one recognized file into an ordered sequence of
//! records. The merge engine only relies on the [`Decoder`] contract, so any
//! of the defaults can be swapped through [`DecoderSet`].
//!
//! - **webvtt.rs**: speech-recognition transcripts
//! - **rttm.rs**: speaker-diarization segments
//! - **json_records.rs**: person-tracking, face-analysis and scene JSON

mod json_records;
mod rttm;
mod webvtt;

pub use json_records::{JsonRecordDecoder, PipelineRecord};
pub use rttm::{parse_rttm, RttmDecoder, SpeakerSegment};
pub use webvtt::{parse_webvtt, SpeechCue, WebVttDecoder};

use async_trait::async_trait;

use crate::core::media::InputFile;
use crate::core::CoreResult;

// =============================================================================
// Decoder Contract
// =============================================================================

/// Decodes a file into pipeline records
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Record type produced by this decoder
    type Record;

    /// Decodes the whole file
    async fn decode(&self, file: &InputFile) -> CoreResult<Vec<Self::Record>>;
}

/// Boxed decoder producing records of type `R`
pub type BoxedDecoder<R> = Box<dyn Decoder<Record = R>>;

// =============================================================================
// Decoder Set
// =============================================================================

/// The decoders used by a merge, one per pipeline
pub struct DecoderSet {
    pub person_tracking: BoxedDecoder<PipelineRecord>,
    pub face_analysis: BoxedDecoder<PipelineRecord>,
    pub scene_detection: BoxedDecoder<PipelineRecord>,
    pub speech_recognition: BoxedDecoder<SpeechCue>,
    pub speaker_diarization: BoxedDecoder<SpeakerSegment>,
}

impl Default for DecoderSet {
    fn default() -> Self {
        Self {
            person_tracking: Box::new(JsonRecordDecoder::person_tracking()),
            face_analysis: Box::new(JsonRecordDecoder::face_analysis()),
            scene_detection: Box::new(JsonRecordDecoder::scene_detection()),
            speech_recognition: Box::new(WebVttDecoder),
            speaker_diarization: Box::new(RttmDecoder),
        }
    }
}

impl std::fmt::Debug for DecoderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderSet").finish_non_exhaustive()
    }
}
