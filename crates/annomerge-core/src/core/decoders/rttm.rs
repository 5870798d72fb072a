//! RTTM Diarization Decoder
//!
//! Parses `SPEAKER` lines of Rich Transcription Time Marked files:
//!
//! ```text
//! SPEAKER meeting 1 0.50 2.25 <NA> <NA> spk_0 <NA> <NA>
//! ```
//!
//! Other record types and `;;` comments are ignored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::media::InputFile;
use crate::core::{CoreError, CoreResult, TimeSec};

use super::Decoder;

const FORMAT: &str = "RTTM";

/// A speaker turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    /// Recording identifier (second RTTM field)
    pub file_id: String,
    /// Audio channel
    pub channel: u32,
    /// Turn onset in seconds
    pub start: TimeSec,
    /// Turn duration in seconds
    pub duration: TimeSec,
    /// Turn end in seconds
    pub end: TimeSec,
    /// Speaker label
    pub speaker: String,
}

/// Default speaker-diarization decoder
#[derive(Clone, Copy, Debug, Default)]
pub struct RttmDecoder;

#[async_trait]
impl Decoder for RttmDecoder {
    type Record = SpeakerSegment;

    async fn decode(&self, file: &InputFile) -> CoreResult<Vec<SpeakerSegment>> {
        let content = file.read_text().await?;
        parse_rttm(&content)
    }
}

/// Parses RTTM content into speaker segments, in file order
pub fn parse_rttm(content: &str) -> CoreResult<Vec<SpeakerSegment>> {
    let mut segments = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(";;") {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields[0] != "SPEAKER" {
            continue;
        }

        let line_no = index + 1;
        if fields.len() < 8 {
            return Err(CoreError::decode(
                FORMAT,
                format!("line {} has {} fields, expected at least 8", line_no, fields.len()),
            ));
        }

        let number = |field: &str, what: &str| -> CoreResult<f64> {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| {
                    CoreError::decode(FORMAT, format!("line {}: invalid {} '{}'", line_no, what, field))
                })
        };

        let start = number(fields[3], "onset")?;
        let duration = number(fields[4], "duration")?;

        segments.push(SpeakerSegment {
            file_id: fields[1].to_string(),
            channel: fields[2].parse().unwrap_or(1),
            start,
            duration,
            end: start + duration,
            speaker: fields[7].to_string(),
        });
    }

    Ok(segments)
}

// =============================================================================
// Tests
// =============================================================================
