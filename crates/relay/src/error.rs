//! Orchestrator-boundary error wrapper.

use driveferry_acquire::AcquireError;
use driveferry_upload::UploadError;

use crate::staging::StagingError;
use crate::types::FailureKind;

/// Any failure the pipeline can produce, tagged by stage at the seams.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Staging(#[from] StagingError),
}

impl RelayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::Acquire(_) => FailureKind::Acquisition,
            RelayError::Upload(_) => FailureKind::Upload,
            RelayError::Staging(_) => FailureKind::Staging,
        }
    }
}
