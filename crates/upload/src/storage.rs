//! Storage backend capability.

use std::future::Future;
use std::pin::Pin;

use driveferry_acquire::StagedFile;
use futures_util::Stream;

use crate::UploadError;

/// Acknowledgement for one accepted chunk of an upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAck {
    /// Cumulative bytes the backend has accepted so far.
    pub bytes_so_far: u64,
    /// Whether this acknowledgement completes the session.
    pub is_final: bool,
    /// Shareable link to the stored object. Present only on the final
    /// acknowledgement.
    pub link: Option<String>,
}

impl ChunkAck {
    pub fn partial(bytes_so_far: u64) -> Self {
        Self {
            bytes_so_far,
            is_final: false,
            link: None,
        }
    }

    pub fn finished(bytes_so_far: u64, link: impl Into<String>) -> Self {
        Self {
            bytes_so_far,
            is_final: true,
            link: Some(link.into()),
        }
    }
}

/// Stream of per-chunk acknowledgements for one upload session.
pub type AckStream = Pin<Box<dyn Stream<Item = Result<ChunkAck, UploadError>> + Send>>;

/// Cloud-storage upload capability.
///
/// `create_resumable` registers the object under `name` (optionally
/// inside `parent`) with the staged file's content type, then streams
/// the file in backend-sized chunks, yielding one acknowledgement per
/// accepted chunk. The backend owns chunk sizing and any wire-level
/// resume handshake; callers only observe the acknowledgement stream.
///
/// Implementations must copy borrowed arguments before any await point;
/// the returned future may only borrow `self`.
pub trait Storage: Send + Sync {
    fn create_resumable(
        &self,
        staged: &StagedFile,
        name: &str,
        parent: Option<&str>,
    ) -> Pin<Box<dyn Future<Output = Result<AckStream, UploadError>> + Send + '_>>;
}
