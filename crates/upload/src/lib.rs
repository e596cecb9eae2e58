//! Resumable chunked upload of a staged file to a storage backend.
//!
//! The backend ([`Storage`]) owns the wire protocol: it opens a session
//! for a staged file and yields an acknowledgement per accepted chunk.
//! The [`Uploader`] drives that stream, enforces cursor monotonicity,
//! feeds the transfer's progress reporter, and extracts the shareable
//! link from the final acknowledgement.

mod storage;
mod uploader;

pub use storage::{AckStream, ChunkAck, Storage};
pub use uploader::{UploadCursor, Uploader};

/// Errors produced while uploading a staged file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage rejected the upload: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("final acknowledgement carried no link")]
    MissingLink,

    #[error("upload stream ended at {sent} of {size} bytes without a final acknowledgement")]
    Incomplete { sent: u64, size: u64 },

    #[error("acknowledged byte count went backwards: {prev} -> {next}")]
    CursorRegression { prev: u64, next: u64 },
}
