//! Video Metadata Probe
//!
//! Extracts duration, dimensions and frame rate from a video container
//! using FFprobe.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::core::{CoreError, CoreResult, TimeSec};

use super::{FileSource, InputFile};

// =============================================================================
// Video Info
// =============================================================================

/// Basic properties of the annotated video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Original file name
    pub filename: String,
    /// Duration in seconds
    pub duration: TimeSec,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frames per second
    pub frame_rate: f64,
}

impl VideoInfo {
    /// Placeholder used when the container could not be read
    pub fn unprobed(filename: &str, frame_rate: f64) -> Self {
        Self {
            filename: filename.to_string(),
            duration: 0.0,
            width: 0,
            height: 0,
            frame_rate,
        }
    }
}

// =============================================================================
// Probe Trait
// =============================================================================

/// Reads [`VideoInfo`] from a video file
#[async_trait]
pub trait VideoProbe: Send + Sync {
    /// Probes the given file
    async fn probe(&self, file: &InputFile) -> CoreResult<VideoInfo>;
}

// =============================================================================
// FFprobe Implementation
// =============================================================================

/// [`VideoProbe`] backed by the `ffprobe` executable
#[derive(Clone, Debug)]
pub struct FfprobeVideoProbe {
    ffprobe_path: String,
    default_frame_rate: f64,
}

impl FfprobeVideoProbe {
    /// Creates a probe running the given executable
    pub fn new(ffprobe_path: &str, default_frame_rate: f64) -> Self {
        Self {
            ffprobe_path: ffprobe_path.to_string(),
            default_frame_rate,
        }
    }

    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.ffprobe_path);
        command.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        command
    }
}

#[async_trait]
impl VideoProbe for FfprobeVideoProbe {
    async fn probe(&self, file: &InputFile) -> CoreResult<VideoInfo> {
        let output = match file.source() {
            FileSource::Path(path) => {
                if !path.exists() {
                    return Err(CoreError::FileNotFound(path.to_string_lossy().to_string()));
                }
                self.command()
                    .arg(path)
                    .output()
                    .await
                    .map_err(|e| CoreError::FFprobeError(format!("Failed to run ffprobe: {}", e)))?
            }
            FileSource::Memory(bytes) => {
                let mut child = self
                    .command()
                    .args(["-i", "pipe:0"])
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|e| CoreError::FFprobeError(format!("Failed to run ffprobe: {}", e)))?;

                // ffprobe may close stdin once it has seen enough of the container.
                if let Some(mut stdin) = child.stdin.take() {
                    let bytes = bytes.clone();
                    tokio::spawn(async move {
                        let _ = stdin.write_all(&bytes).await;
                    });
                }

                child
                    .wait_with_output()
                    .await
                    .map_err(|e| CoreError::FFprobeError(format!("Failed to run ffprobe: {}", e)))?
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::FFprobeError(format!("FFprobe failed: {}", stderr)));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&json_str, file.name(), self.default_frame_rate)
    }
}

/// Parses FFprobe JSON output into [`VideoInfo`]
///
/// Only the first video stream is considered. A missing or degenerate
/// `r_frame_rate` falls back to `default_frame_rate`.
pub fn parse_probe_output(
    json_str: &str,
    filename: &str,
    default_frame_rate: f64,
) -> CoreResult<VideoInfo> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| CoreError::FFprobeError(format!("Failed to parse FFprobe output: {}", e)))?;

    let format = json
        .get("format")
        .ok_or_else(|| CoreError::FFprobeError("Missing format info".to_string()))?;

    let duration = format
        .get("duration")
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let video_stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some("video"))
        })
        .ok_or_else(|| CoreError::FFprobeError("No video stream".to_string()))?;

    let width = video_stream
        .get("width")
        .and_then(|w| w.as_u64())
        .unwrap_or(0) as u32;

    let height = video_stream
        .get("height")
        .and_then(|h| h.as_u64())
        .unwrap_or(0) as u32;

    let frame_rate = video_stream
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .and_then(parse_frame_rate)
        .unwrap_or(default_frame_rate);

    Ok(VideoInfo {
        filename: filename.to_string(),
        duration,
        width,
        height,
        frame_rate,
    })
}

/// Parses "30/1", "30000/1001" or "25"
fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

// =============================================================================
// Tests
// =============================================================================
