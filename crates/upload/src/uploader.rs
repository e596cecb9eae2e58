//! Acknowledgement-stream driver for one upload.

use std::sync::Arc;

use driveferry_acquire::StagedFile;
use driveferry_progress::{Phase, ProgressReporter, ProgressUpdate};
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::UploadError;
use crate::storage::Storage;

/// Monotone acknowledgement cursor.
///
/// The backend acknowledges cumulative byte counts; a count below the
/// cursor means the session state and ours have diverged, and the upload
/// is aborted rather than silently rewound.
#[derive(Debug, Default)]
pub struct UploadCursor {
    position: u64,
}

impl UploadCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Advances to `next`, rejecting regressions. Repeats of the current
    /// position are allowed (the backend may re-acknowledge on retry).
    pub fn advance(&mut self, next: u64) -> Result<u64, UploadError> {
        if next < self.position {
            return Err(UploadError::CursorRegression {
                prev: self.position,
                next,
            });
        }
        self.position = next;
        Ok(next)
    }
}

/// Drives one staged file through a storage backend's upload session.
pub struct Uploader<S: Storage + ?Sized> {
    storage: Arc<S>,
}

impl<S: Storage + ?Sized> Uploader<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Uploads `staged` under `name` (inside `parent`, when given) and
    /// returns the shareable link.
    ///
    /// Switches the reporter into its upload phase before the first
    /// chunk, then records every acknowledged byte count. The stream is
    /// consumed until a final acknowledgement; a stream that ends early
    /// or finishes without a link is an error, not a silent success.
    pub async fn upload(
        &self,
        staged: &StagedFile,
        name: &str,
        parent: Option<&str>,
        reporter: &Arc<ProgressReporter>,
    ) -> Result<String, UploadError> {
        reporter.begin_upload(staged.size);
        debug!(name, size = staged.size, "opening upload session");

        let mut acks = self.storage.create_resumable(staged, name, parent).await?;
        let mut cursor = UploadCursor::new();

        while let Some(ack) = acks.next().await {
            let ack = ack?;
            cursor.advance(ack.bytes_so_far)?;
            reporter.record(ProgressUpdate::bytes(ack.bytes_so_far).in_phase(Phase::Uploading));

            if ack.is_final {
                let link = ack.link.ok_or(UploadError::MissingLink)?;
                info!(name, size = staged.size, "upload complete");
                return Ok(link);
            }
        }

        Err(UploadError::Incomplete {
            sent: cursor.position(),
            size: staged.size,
        })
    }
}
