//! Staged-file metadata.

use std::path::{Path, PathBuf};

use crate::AcquireError;

/// A locally persisted copy of the source media, exclusively owned by one
/// transfer. The path lives inside the transfer's staging directory and is
/// fully written before anything reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: &'static str,
}

impl StagedFile {
    /// Builds staged-file metadata from an existing, fully written file.
    pub fn from_path(path: &Path) -> Result<Self, AcquireError> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            content_type: detect_content_type(path),
        })
    }
}

/// Infers a MIME content type from a file extension.
///
/// Covers the media and document types the relay commonly moves; anything
/// else falls back to `application/octet-stream`.
pub fn detect_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("opus" | "ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
