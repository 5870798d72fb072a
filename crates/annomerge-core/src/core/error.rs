//! Annomerge Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // =========================================================================
    // Decode Errors
    // =========================================================================
    #[error("Invalid {format} content: {message}")]
    DecodeFailed { format: String, message: String },

    #[error("Invalid complete results bundle: {0}")]
    InvalidBundle(String),

    // =========================================================================
    // Merge Errors
    // =========================================================================
    #[error("No video file found")]
    MissingVideo,

    #[error("FFprobe error: {0}")]
    FFprobeError(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Creates a decode failure for the given format
    pub fn decode(format: &str, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            format: format.to_string(),
            message: message.into(),
        }
    }
}
