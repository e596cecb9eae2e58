//! Per-transfer staging directory.

use std::path::Path;

use tempfile::TempDir;

/// The staging directory could not be created.
#[derive(Debug, thiserror::Error)]
#[error("staging area unavailable: {0}")]
pub struct StagingError(#[from] std::io::Error);

/// Scratch directory holding one transfer's downloaded artifacts.
///
/// Owned by the orchestrator for the request's lifetime and removed with
/// everything in it when dropped, on success and on every error path
/// alike.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Creates a staging directory under the system temp location.
    pub fn new() -> Result<Self, StagingError> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Creates a staging directory under `root`. `root` must exist.
    pub fn in_root(root: &Path) -> Result<Self, StagingError> {
        Ok(Self {
            dir: tempfile::tempdir_in(root)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
