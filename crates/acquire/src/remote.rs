//! Remote acquisition: quality-negotiated extraction of a remote stream.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use driveferry_progress::{Phase, ProgressReporter, ProgressUpdate};
use tracing::debug;

use crate::AcquireError;
use crate::acquirer::{Acquired, SourceName};
use crate::catalog::{
    FormatSelector, MediaMetadata, QualityCatalog, QualityHint, infer_rung_from_name,
    resolve_selector,
};
use crate::staged::StagedFile;

/// Tuning for remote acquisition.
#[derive(Debug, Clone, Copy)]
pub struct RemoteOptions {
    /// Height ceiling applied by the `best` selector.
    pub quality_ceiling: u32,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            quality_ceiling: 1080,
        }
    }
}

/// One progress report from the extraction engine's native callback.
#[derive(Debug, Clone, Default)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
    pub speed_bps: Option<f64>,
    /// Name of the file currently being written, when the engine says.
    pub filename: Option<String>,
}

/// Callback the engine invokes as bytes arrive.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Remote-media extraction capability.
///
/// `resolve` runs in metadata-only mode; `download` streams the selected
/// format into `dest_dir`, merging separate video/audio streams into one
/// container when the selector implies them, and returns the output path.
///
/// Implementations must copy borrowed arguments before any await point;
/// the returned future may only borrow `self`.
pub trait MediaExtractor: Send + Sync {
    fn resolve(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<MediaMetadata, AcquireError>> + Send + '_>>;

    fn download(
        &self,
        url: &str,
        selector: FormatSelector,
        dest_dir: &Path,
        on_progress: ProgressCallback,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, AcquireError>> + Send + '_>>;
}

pub(crate) async fn acquire_remote(
    extractor: &dyn MediaExtractor,
    url: &str,
    hint: QualityHint,
    options: RemoteOptions,
    dest_dir: &Path,
    reporter: &Arc<ProgressReporter>,
) -> Result<Acquired, AcquireError> {
    if url.trim().is_empty() {
        return Err(AcquireError::InvalidLocator("empty URL".into()));
    }

    let meta = extractor.resolve(url).await?;
    let catalog = QualityCatalog::from_metadata(&meta);
    if catalog.rungs.is_empty() && !catalog.has_audio {
        return Err(AcquireError::NoQualities(url.into()));
    }

    let selector = resolve_selector(hint, &catalog, options.quality_ceiling);
    debug!(
        url,
        title = %catalog.title,
        selector = %selector.expression(),
        "resolved format selector"
    );

    // Seed the reporter with what the catalog already knows.
    let mut seed = ProgressUpdate::default().in_phase(Phase::Downloading);
    seed.total = catalog.total_size;
    seed.quality = match selector {
        FormatSelector::AudioOnly => Some("audio".into()),
        FormatSelector::Video { max_height } => catalog
            .rungs
            .iter()
            .find(|r| r.height <= max_height)
            .map(|r| r.label.to_string()),
    };
    reporter.record(seed);

    // Tagged with the download phase so an engine callback that fires
    // after this stage cannot write into the upload phase.
    let callback_reporter = Arc::clone(reporter);
    let on_progress: ProgressCallback = Arc::new(move |p: DownloadProgress| {
        let mut update = ProgressUpdate::bytes(p.downloaded).in_phase(Phase::Downloading);
        update.total = p.total;
        update.speed_bps = p.speed_bps;
        if let Some(name) = &p.filename
            && let Some(rung) = infer_rung_from_name(name)
        {
            update.quality = Some(rung.to_string());
        }
        callback_reporter.record(update);
    });

    let reported = extractor
        .download(url, selector, dest_dir, on_progress)
        .await?;
    let output = locate_output(&reported, dest_dir, selector)?;
    let staged = StagedFile::from_path(&output)?;
    debug!(path = %output.display(), size = staged.size, "remote acquisition staged");

    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4")
        .to_string();

    Ok(Acquired {
        staged,
        source_name: SourceName::Title {
            title: catalog.title,
            ext,
        },
    })
}

/// Finds the download's output file.
///
/// Trusts the engine-reported path when it exists with an expected
/// container extension; otherwise scans the staging directory for the
/// largest file carrying one. Merging can rename the final container, so
/// the reported path alone is not authoritative.
fn locate_output(
    reported: &Path,
    dest_dir: &Path,
    selector: FormatSelector,
) -> Result<PathBuf, AcquireError> {
    let expected = selector.expected_extensions();
    let has_expected_ext = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| expected.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    };

    if reported.is_file() && has_expected_ext(reported) {
        return Ok(reported.to_path_buf());
    }

    let mut candidates: Vec<(u64, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dest_dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_file() && has_expected_ext(&entry.path()) {
            candidates.push((meta.len(), entry.path()));
        }
    }
    candidates.sort();
    candidates
        .pop()
        .map(|(_, p)| p)
        .ok_or_else(|| AcquireError::MissingOutput(dest_dir.display().to_string()))
}
