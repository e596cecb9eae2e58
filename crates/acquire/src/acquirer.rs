//! Source acquisition dispatch.

use std::path::Path;
use std::sync::Arc;

use driveferry_progress::ProgressReporter;

use crate::AcquireError;
use crate::catalog::QualityHint;
use crate::direct::{DirectSource, MediaHandle, acquire_direct};
use crate::remote::{MediaExtractor, RemoteOptions, acquire_remote};
use crate::staged::StagedFile;

/// How the acquired file should be named downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceName {
    /// The platform supplied a filename (or we synthesized one); use it
    /// as-is.
    Original(String),
    /// The source exposed a human title; the destination name is derived
    /// from it plus the staged container extension.
    Title { title: String, ext: String },
}

/// A staged local file plus its naming intent.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub staged: StagedFile,
    pub source_name: SourceName,
}

/// One acquisition task, bound to the capability that can perform it.
///
/// Both variants download into the caller's staging directory and feed
/// the shared reporter as bytes arrive.
pub enum Acquirer {
    /// Media attached to a platform message, fetched verbatim.
    Direct {
        source: Arc<dyn DirectSource>,
        handle: MediaHandle,
    },
    /// A URL resolved through the extraction engine with quality
    /// negotiation.
    Remote {
        extractor: Arc<dyn MediaExtractor>,
        url: String,
        hint: QualityHint,
        options: RemoteOptions,
    },
}

impl Acquirer {
    pub async fn acquire(
        &self,
        dest_dir: &Path,
        reporter: &Arc<ProgressReporter>,
    ) -> Result<Acquired, AcquireError> {
        match self {
            Acquirer::Direct { source, handle } => {
                acquire_direct(source.as_ref(), handle, dest_dir, reporter).await
            }
            Acquirer::Remote {
                extractor,
                url,
                hint,
                options,
            } => acquire_remote(extractor.as_ref(), url, *hint, *options, dest_dir, reporter).await,
        }
    }
}
