//! Input File Handles
//!
//! A file handle is either a path on disk or an in-memory blob. Handles are
//! cheap to clone and never written to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::core::{CoreError, CoreResult};

/// Where the bytes of an input file live
#[derive(Clone, Debug)]
pub enum FileSource {
    /// File on the local filesystem
    Path(PathBuf),
    /// Shared in-memory buffer
    Memory(Arc<[u8]>),
}

/// A single uploaded file
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    /// File name as supplied by the user (no directories)
    name: String,
    /// MIME type, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    /// Size in bytes
    size: u64,
    #[serde(skip)]
    source: FileSource,
}

impl InputFile {
    /// Opens a file on disk
    ///
    /// The MIME type is guessed from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CoreError::FileNotFound(path.to_string_lossy().to_string()));
        }

        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());

        Ok(Self {
            name,
            mime_type,
            size,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Wraps an in-memory blob
    pub fn from_bytes(name: &str, mime_type: Option<&str>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            name: name.to_string(),
            mime_type: mime_type.map(str::to_string),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Returns the file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the MIME type, if known
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the byte source
    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Returns the lowercase extension of the file name, without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Reads at most `limit` bytes from the start of the file
    pub async fn read_prefix(&self, limit: usize) -> CoreResult<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes[..limit.min(bytes.len())].to_vec()),
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let mut buf = Vec::with_capacity(limit.min(self.size as usize));
                file.take(limit as u64).read_to_end(&mut buf).await?;
                Ok(buf)
            }
        }
    }

    /// Reads at most `limit` bytes as text, replacing invalid UTF-8
    pub async fn read_text_prefix(&self, limit: usize) -> CoreResult<String> {
        let bytes = self.read_prefix(limit).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads the whole file
    pub async fn read_all(&self) -> CoreResult<Vec<u8>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }

    /// Reads the whole file as text, replacing invalid UTF-8
    pub async fn read_text(&self) -> CoreResult<String> {
        let bytes = self.read_all().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// =============================================================================
// Tests
// =============================================================================
