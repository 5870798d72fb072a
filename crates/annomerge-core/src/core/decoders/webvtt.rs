//! WebVTT Transcript Decoder
//!
//! Parses speech-recognition output into timed cues.
//!
//! ```text
//! WEBVTT
//!
//! 1
//! 00:00:01.000 --> 00:00:04.000
//! <v Alice>First caption text
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::media::InputFile;
use crate::core::{CoreError, CoreResult, TimeSec};

use super::Decoder;

const FORMAT: &str = "WebVTT";

/// A timed transcript cue
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechCue {
    /// Cue identifier, if the file gave one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Start time in seconds
    pub start: TimeSec,
    /// End time in seconds
    pub end: TimeSec,
    /// Cue text with markup removed
    pub text: String,
    /// Speaker from a `<v Name>` voice span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// Default speech-recognition decoder
#[derive(Clone, Copy, Debug, Default)]
pub struct WebVttDecoder;

#[async_trait]
impl Decoder for WebVttDecoder {
    type Record = SpeechCue;

    async fn decode(&self, file: &InputFile) -> CoreResult<Vec<SpeechCue>> {
        let content = file.read_text().await?;
        parse_webvtt(&content)
    }
}

/// Parses WebVTT content into cues
pub fn parse_webvtt(content: &str) -> CoreResult<Vec<SpeechCue>> {
    let mut cues = Vec::new();
    let mut lines = content.trim_start_matches('\u{feff}').lines().peekable();

    match lines.next() {
        Some(first) if first.trim_start().starts_with("WEBVTT") => {}
        _ => return Err(CoreError::decode(FORMAT, "file must start with WEBVTT")),
    }

    // Header metadata runs until the first blank line
    while lines.peek().is_some_and(|l| !l.trim().is_empty()) {
        lines.next();
    }

    loop {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(first_line) = lines.next() else {
            break;
        };

        // NOTE, STYLE and REGION blocks carry no cues
        let block_kind = first_line.split_whitespace().next().unwrap_or_default();
        if matches!(block_kind, "NOTE" | "STYLE" | "REGION") {
            while lines.peek().is_some_and(|l| !l.trim().is_empty()) {
                lines.next();
            }
            continue;
        }

        let (id, timing_line) = if first_line.contains("-->") {
            (None, first_line)
        } else {
            let timing = lines
                .next()
                .ok_or_else(|| CoreError::decode(FORMAT, "unexpected end of input"))?;
            (Some(first_line.trim().to_string()), timing)
        };

        let (start, end) = parse_timing_line(timing_line)?;

        let mut text_lines = Vec::new();
        let mut speaker = None;
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            if speaker.is_none() {
                speaker = voice_name(line);
            }
            text_lines.push(strip_tags(line));
            lines.next();
        }

        cues.push(SpeechCue {
            id,
            start,
            end,
            text: text_lines.join("\n"),
            speaker,
        });
    }

    Ok(cues)
}

/// Parses "00:00:01.000 --> 00:00:04.000 align:start"
fn parse_timing_line(line: &str) -> CoreResult<(TimeSec, TimeSec)> {
    let (start_str, end_part) = line.split_once("-->").ok_or_else(|| {
        CoreError::decode(FORMAT, format!("expected 'start --> end' in: {}", line))
    })?;

    // Cue settings may follow the end timestamp
    let end_part = end_part.trim();
    let end_str = end_part.split_whitespace().next().unwrap_or(end_part);

    let start = parse_timestamp(start_str.trim())?;
    let end = parse_timestamp(end_str)?;
    Ok((start, end))
}

/// Parses "01:23.456" or "00:01:23.456" into seconds
fn parse_timestamp(ts: &str) -> CoreResult<TimeSec> {
    let invalid = || CoreError::decode(FORMAT, format!("invalid timestamp: {}", ts));
    let parts: Vec<f64> = ts
        .split(':')
        .map(|p| p.parse::<f64>().map_err(|_| invalid()))
        .collect::<CoreResult<_>>()?;

    match parts.as_slice() {
        [minutes, seconds] => Ok(minutes * 60.0 + seconds),
        [hours, minutes, seconds] => Ok(hours * 3600.0 + minutes * 60.0 + seconds),
        _ => Err(invalid()),
    }
}

/// Extracts the speaker from a `<v Name>` or `<v.class Name>` span
fn voice_name(line: &str) -> Option<String> {
    let start = line.find("<v")?;
    let rest = &line[start + 2..];
    if !rest.starts_with([' ', '.']) {
        return None;
    }
    let tag = &rest[..rest.find('>')?];
    let name = tag.split_once(' ')?.1.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Removes `<...>` markup from cue text
fn strip_tags(text: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

// =============================================================================
// Tests
// =============================================================================
