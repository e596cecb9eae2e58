//! Transfer orchestration: one request through staging, acquisition and
//! upload, with progress emission bracketing each phase.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use driveferry_acquire::{Acquirer, DirectSource, MediaExtractor, RemoteOptions};
use driveferry_progress::{PeriodicEmitter, ProgressReporter, ProgressSink};
use driveferry_upload::{Storage, Uploader};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::RelayError;
use crate::naming::destination_name;
use crate::staging::StagingArea;
use crate::types::{SourceKind, TransferRequest, TransferResult};

/// Process-wide orchestration tuning.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Height ceiling applied when a remote request asks for `best`.
    pub quality_ceiling: u32,
    /// Minimum interval between progress emissions per transfer.
    pub progress_cooldown: Duration,
    /// Cadence of the background emission task.
    pub emitter_period: Duration,
    /// Default destination folder, overridable per request.
    pub folder_hint: Option<String>,
    /// Parent directory for staging areas; system temp when unset.
    pub staging_root: Option<PathBuf>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            quality_ceiling: 1080,
            progress_cooldown: ProgressReporter::DEFAULT_COOLDOWN,
            emitter_period: PeriodicEmitter::DEFAULT_PERIOD,
            folder_hint: None,
            staging_root: None,
        }
    }
}

/// Drives transfer requests end to end over injected capabilities.
///
/// One instance serves the whole process; each request gets its own
/// reporter and staging area, so concurrent transfers share nothing
/// mutable.
pub struct TransferOrchestrator {
    direct: Arc<dyn DirectSource>,
    extractor: Arc<dyn MediaExtractor>,
    storage: Arc<dyn Storage>,
    settings: RelaySettings,
}

impl TransferOrchestrator {
    pub fn new(
        direct: Arc<dyn DirectSource>,
        extractor: Arc<dyn MediaExtractor>,
        storage: Arc<dyn Storage>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            direct,
            extractor,
            storage,
            settings,
        }
    }

    /// Runs one request to completion and reports the outcome through the
    /// sink. Pipeline failures become [`TransferResult::Failure`]; this
    /// method itself never fails.
    pub async fn run(
        &self,
        request: &TransferRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> TransferResult {
        info!(request_id = %request.id, "transfer started");
        let reporter = Arc::new(ProgressReporter::new(self.settings.progress_cooldown));

        match self.run_pipeline(request, &reporter, &sink).await {
            Ok((name, link)) => {
                info!(request_id = %request.id, name = %name, "transfer completed");
                let _ = sink.push(&format!("✅ Uploaded {name}\n{link}")).await;
                TransferResult::Link(link)
            }
            Err(err) => {
                let kind = err.kind();
                let message = err.to_string();
                error!(
                    request_id = %request.id,
                    stage = %kind,
                    error = %message,
                    "transfer failed"
                );
                let _ = sink.push(&format!("❌ {kind}: {message}")).await;
                TransferResult::Failure { kind, message }
            }
        }
    }

    /// Spawns `run` as an independent task.
    pub fn spawn(
        self: &Arc<Self>,
        request: TransferRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> JoinHandle<TransferResult> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run(&request, sink).await })
    }

    async fn run_pipeline(
        &self,
        request: &TransferRequest,
        reporter: &Arc<ProgressReporter>,
        sink: &Arc<dyn ProgressSink>,
    ) -> Result<(String, String), RelayError> {
        // The staging area lives for the rest of this function; dropping
        // it on any return path removes the directory and its contents.
        let staging = match &self.settings.staging_root {
            Some(root) => StagingArea::in_root(root)?,
            None => StagingArea::new()?,
        };
        debug!(
            request_id = %request.id,
            dir = %staging.path().display(),
            "staging area ready"
        );

        let acquirer = match &request.source {
            SourceKind::Direct(handle) => Acquirer::Direct {
                source: Arc::clone(&self.direct),
                handle: handle.clone(),
            },
            SourceKind::Remote(url) => Acquirer::Remote {
                extractor: Arc::clone(&self.extractor),
                url: url.clone(),
                hint: request.quality_hint.unwrap_or_default(),
                options: RemoteOptions {
                    quality_ceiling: self.settings.quality_ceiling,
                },
            },
        };

        // Emission runs only while its phase does; stop() joins the task,
        // so no progress text lands after a phase has ended.
        let emitter = PeriodicEmitter::spawn(
            Arc::clone(reporter),
            Arc::clone(sink),
            self.settings.emitter_period,
        );
        let acquired = acquirer.acquire(staging.path(), reporter).await;
        emitter.stop().await;
        let acquired = acquired?;

        let name = destination_name(&acquired.source_name);
        let parent = request
            .folder_hint
            .as_deref()
            .or(self.settings.folder_hint.as_deref());
        debug!(
            request_id = %request.id,
            name = %name,
            size = acquired.staged.size,
            "staged, starting upload"
        );

        let emitter = PeriodicEmitter::spawn(
            Arc::clone(reporter),
            Arc::clone(sink),
            self.settings.emitter_period,
        );
        let uploaded = Uploader::new(Arc::clone(&self.storage))
            .upload(&acquired.staged, &name, parent, reporter)
            .await;
        emitter.stop().await;
        let link = uploaded?;

        Ok((name, link))
    }
}
