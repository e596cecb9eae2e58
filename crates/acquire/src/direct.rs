//! Direct-transfer acquisition: media the chat platform downloads for us.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use driveferry_progress::{Phase, ProgressReporter, ProgressUpdate};
use serde::Deserialize;
use tracing::debug;

use crate::AcquireError;
use crate::acquirer::{Acquired, SourceName};
use crate::staged::StagedFile;

/// Opaque reference to a piece of media the chat platform can fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaHandle {
    /// Platform-assigned identifier, stable for the request's lifetime.
    pub id: String,
    /// Original filename, when the platform knows one.
    pub file_name: Option<String>,
    /// Size in bytes, when the platform reports one up front.
    pub size: Option<u64>,
}

/// Callback invoked with cumulative downloaded byte counts.
pub type ByteCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Chat-platform download capability.
///
/// `fetch` downloads the media behind `handle` into `dest_dir`, invoking
/// `on_bytes` with cumulative byte counts as data arrives. The returned
/// path may be a single file or a directory of variants (e.g. a photo
/// delivered at several resolutions).
///
/// Implementations must copy borrowed arguments before any await point;
/// the returned future may only borrow `self`.
pub trait DirectSource: Send + Sync {
    fn fetch(
        &self,
        handle: &MediaHandle,
        dest_dir: &Path,
        on_bytes: ByteCallback,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, AcquireError>> + Send + '_>>;
}

pub(crate) async fn acquire_direct(
    source: &dyn DirectSource,
    handle: &MediaHandle,
    dest_dir: &Path,
    reporter: &Arc<ProgressReporter>,
) -> Result<Acquired, AcquireError> {
    if let Some(size) = handle.size {
        reporter.record(ProgressUpdate::total(size).in_phase(Phase::Downloading));
    }

    // Tagged with the download phase: if the platform holds on to the
    // callback past this stage, its counts are dropped instead of
    // corrupting the upload phase.
    let byte_reporter = Arc::clone(reporter);
    let on_bytes: ByteCallback = Arc::new(move |downloaded| {
        byte_reporter.record(ProgressUpdate::bytes(downloaded).in_phase(Phase::Downloading));
    });

    let path = source.fetch(handle, dest_dir, on_bytes).await?;
    let artifact = canonical_artifact(&path)?;
    let staged = StagedFile::from_path(&artifact)?;
    debug!(
        path = %artifact.display(),
        size = staged.size,
        "direct acquisition staged"
    );

    let name = match &handle.file_name {
        Some(name) => name.clone(),
        // Nameless media get a synthetic name keyed by the handle id.
        None => match artifact.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("tg_file_{}.{ext}", handle.id),
            None => format!("tg_file_{}", handle.id),
        },
    };

    Ok(Acquired {
        staged,
        source_name: SourceName::Original(name),
    })
}

/// Resolves the platform's result path to a single canonical file.
///
/// A directory result is a multi-variant container; the largest file wins,
/// with path order as the deterministic tie-break.
fn canonical_artifact(path: &Path) -> Result<PathBuf, AcquireError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| AcquireError::MissingOutput(path.display().to_string()))?;
    if metadata.is_file() {
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<(u64, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let entry_meta = entry.metadata()?;
        if entry_meta.is_file() {
            candidates.push((entry_meta.len(), entry.path()));
        }
    }
    candidates.sort();
    candidates
        .pop()
        .map(|(_, p)| p)
        .ok_or(AcquireError::EmptyContainer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock platform that stages canned files and records callbacks.
    struct MockPlatform {
        /// (relative name, size) pairs to create; a lone pair returns the
        /// file directly, several return the containing directory.
        files: Vec<(&'static str, usize)>,
        reported: Mutex<Vec<u64>>,
    }

    impl MockPlatform {
        fn new(files: Vec<(&'static str, usize)>) -> Self {
            Self {
                files,
                reported: Mutex::new(Vec::new()),
            }
        }
    }

    impl DirectSource for MockPlatform {
        fn fetch(
            &self,
            _handle: &MediaHandle,
            dest_dir: &Path,
            on_bytes: ByteCallback,
        ) -> Pin<Box<dyn Future<Output = Result<PathBuf, AcquireError>> + Send + '_>> {
            let dest = dest_dir.to_path_buf();
            Box::pin(async move {
                let mut total = 0u64;
                let mut last = dest.clone();
                for (name, size) in &self.files {
                    let path = dest.join(name);
                    std::fs::write(&path, vec![0u8; *size])?;
                    total += *size as u64;
                    on_bytes(total);
                    last = path;
                }
                self.reported.lock().unwrap().push(total);
                if self.files.len() == 1 {
                    Ok(last)
                } else {
                    Ok(dest)
                }
            })
        }
    }

    fn handle(name: Option<&str>) -> MediaHandle {
        MediaHandle {
            id: "AbC123".into(),
            file_name: name.map(Into::into),
            size: None,
        }
    }

    fn reporter() -> Arc<ProgressReporter> {
        Arc::new(ProgressReporter::new(std::time::Duration::ZERO))
    }

    #[tokio::test]
    async fn single_file_is_staged_with_original_name() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::new(vec![("report.pdf", 100)]);
        let r = reporter();

        let acquired = acquire_direct(&platform, &handle(Some("report.pdf")), dir.path(), &r)
            .await
            .unwrap();

        assert_eq!(acquired.staged.size, 100);
        assert_eq!(acquired.staged.content_type, "application/pdf");
        assert_eq!(
            acquired.source_name,
            SourceName::Original("report.pdf".into())
        );
        assert_eq!(r.snapshot().bytes, 100);
    }

    #[tokio::test]
    async fn container_selects_largest_file() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::new(vec![
            ("photo_s.jpg", 10),
            ("photo_l.jpg", 999),
            ("photo_m.jpg", 5),
        ]);
        let r = reporter();

        let acquired = acquire_direct(&platform, &handle(None), dir.path(), &r)
            .await
            .unwrap();

        assert_eq!(acquired.staged.size, 999);
        assert!(acquired.staged.path.ends_with("photo_l.jpg"));
    }

    #[tokio::test]
    async fn nameless_media_gets_synthetic_name() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::new(vec![("v.jpg", 7)]);
        let r = reporter();

        let acquired = acquire_direct(&platform, &handle(None), dir.path(), &r)
            .await
            .unwrap();

        assert_eq!(
            acquired.source_name,
            SourceName::Original("tg_file_AbC123.jpg".into())
        );
    }

    #[tokio::test]
    async fn known_size_seeds_the_total() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::new(vec![("doc.txt", 50)]);
        let r = reporter();
        let mut h = handle(Some("doc.txt"));
        h.size = Some(50);

        acquire_direct(&platform, &h, dir.path(), &r).await.unwrap();
        assert_eq!(r.snapshot().total, Some(50));
    }

    #[tokio::test]
    async fn empty_container_errors() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::new(vec![]);
        let r = reporter();

        let result = acquire_direct(&platform, &handle(None), dir.path(), &r).await;
        assert!(matches!(result, Err(AcquireError::EmptyContainer)));
    }

    #[test]
    fn canonical_artifact_missing_path_errors() {
        let result = canonical_artifact(Path::new("/nonexistent/nothing"));
        assert!(matches!(result, Err(AcquireError::MissingOutput(_))));
    }

    #[test]
    fn largest_file_tie_break_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        // Two equal-size files — lexicographically later path wins.
        std::fs::write(dir.path().join("a.bin"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("b.bin"), vec![0u8; 10]).unwrap();

        let first = canonical_artifact(dir.path()).unwrap();
        let second = canonical_artifact(dir.path()).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with("b.bin"));
    }
}
