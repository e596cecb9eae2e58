use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::reporter::{ProgressReporter, ProgressSink};

/// Background task that calls [`ProgressReporter::maybe_emit`] at a fixed
/// cadence, decoupling UI refresh rate from network-callback jitter.
///
/// The task is cancelled *and joined* by [`PeriodicEmitter::stop`], so once
/// `stop` returns no further emission can fire — required before the
/// pipeline moves to its next phase.
pub struct PeriodicEmitter {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicEmitter {
    /// Default emission cadence.
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

    /// Spawns the emitter task.
    pub fn spawn(
        reporter: Arc<ProgressReporter>,
        sink: Arc<dyn ProgressSink>,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reporter.maybe_emit(sink.as_ref()).await;
                    }
                    _ = token.cancelled() => {
                        break;
                    }
                }
            }
        });
        Self { cancel, handle }
    }

    /// Cancels the task and waits for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
