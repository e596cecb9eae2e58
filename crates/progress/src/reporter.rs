use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::render::render_snapshot;
use crate::state::{Phase, ProgressState, ProgressUpdate, Snapshot};

/// Error returned by a [`ProgressSink`] when an update cannot be delivered
/// (e.g. the UI message was deleted). Always swallowed by the reporter.
#[derive(Debug, thiserror::Error)]
#[error("progress sink rejected update: {0}")]
pub struct SinkError(pub String);

/// Capability accepting rendered progress snapshots, e.g. a handle that
/// edits a chat message in place.
///
/// Implementations must copy `text` before any await point; the returned
/// future may only borrow `self`.
pub trait ProgressSink: Send + Sync {
    fn push(&self, text: &str) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>>;
}

/// Rate-limited, thread-safe accumulator of per-transfer progress.
///
/// `record` merges partial updates under a mutex and never performs I/O;
/// `maybe_emit` renders and pushes a snapshot at most once per cooldown
/// window. The two are safe to call concurrently from different execution
/// contexts (a network callback versus a UI-refresh task).
pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    cooldown: Duration,
}

impl ProgressReporter {
    /// Default minimum interval between consecutive UI emissions.
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(ProgressState::new()),
            cooldown,
        }
    }

    /// Merges a partial update into the tracked state without blocking.
    ///
    /// Byte counts are monotone within a phase: a stale, lower count is
    /// dropped rather than rewinding the state. An update tagged with a
    /// phase other than the current one is dropped entirely, so a
    /// download callback that outlives its stage cannot write into the
    /// upload phase.
    pub fn record(&self, update: ProgressUpdate) {
        let mut s = self.state.lock().unwrap();

        if let Some(phase) = update.phase
            && phase != s.phase
        {
            debug!(
                current = s.phase.label(),
                stale = phase.label(),
                "dropping update from an earlier phase"
            );
            return;
        }

        if let Some(bytes) = update.bytes {
            if bytes < s.bytes {
                debug!(
                    recorded = s.bytes,
                    stale = bytes,
                    "dropping stale byte count"
                );
            } else {
                if bytes > s.bytes {
                    let delta = bytes - s.bytes;
                    s.rate.observe(delta);
                }
                s.bytes = bytes;
            }
        }
        if let Some(total) = update.total {
            s.total = Some(total);
        }
        if let Some(quality) = update.quality {
            s.quality = Some(quality);
        }
        s.speed_bps = match update.speed_bps {
            // Engine-reported speed wins over the window estimate.
            Some(bps) => bps,
            None => s.rate.per_second().unwrap_or(s.speed_bps),
        };
    }

    /// Transitions the transfer into its upload phase.
    ///
    /// Happens exactly once per transfer; byte accounting restarts at zero
    /// against the staged file's known size. A second call is ignored.
    pub fn begin_upload(&self, total: u64) {
        let mut s = self.state.lock().unwrap();
        match s.phase {
            Phase::Downloading => {
                s.phase = Phase::Uploading;
                s.bytes = 0;
                s.total = Some(total);
                s.speed_bps = 0.0;
                s.rate.restart();
            }
            Phase::Uploading => {
                warn!("upload phase already active, ignoring transition");
            }
        }
    }

    /// Returns a point-in-time copy of the tracked state.
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().unwrap().snapshot()
    }

    /// Emits a rendered snapshot through `sink` if the cooldown has elapsed
    /// and there is something to show; otherwise a no-op.
    ///
    /// Never emits before the first nonzero byte count, never re-sends an
    /// unchanged message, and never fails: sink errors are swallowed since
    /// progress reporting is best-effort and must not abort the transfer.
    pub async fn maybe_emit(&self, sink: &dyn ProgressSink) {
        let text = {
            let mut s = self.state.lock().unwrap();
            if s.bytes == 0 {
                return;
            }
            let now = Instant::now();
            if let Some(last) = s.last_emit
                && now.duration_since(last) < self.cooldown
            {
                return;
            }
            let text = render_snapshot(&s.snapshot());
            if s.last_text.as_deref() == Some(text.as_str()) {
                return;
            }
            s.last_emit = Some(now);
            s.last_text = Some(text.clone());
            text
        };

        if let Err(err) = sink.push(&text).await {
            debug!(error = %err, "progress emission dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct CountingSink {
        pub texts: Mutex<Vec<String>>,
    }

    impl CountingSink {
        pub fn new() -> Self {
            Self {
                texts: Mutex::new(Vec::new()),
            }
        }

        pub fn count(&self) -> usize {
            self.texts.lock().unwrap().len()
        }
    }

    impl ProgressSink for CountingSink {
        fn push(
            &self,
            text: &str,
        ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
            let text = text.to_string();
            Box::pin(async move {
                self.texts.lock().unwrap().push(text);
                Ok(())
            })
        }
    }

    struct FailingSink {
        attempts: AtomicUsize,
    }

    impl ProgressSink for FailingSink {
        fn push(
            &self,
            _text: &str,
        ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
            Box::pin(async move {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                Err(SinkError("message deleted".into()))
            })
        }
    }

    #[test]
    fn bytes_are_monotone_within_phase() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        reporter.record(ProgressUpdate::bytes(100));
        reporter.record(ProgressUpdate::bytes(40));
        assert_eq!(reporter.snapshot().bytes, 100);

        reporter.record(ProgressUpdate::bytes(250));
        assert_eq!(reporter.snapshot().bytes, 250);
    }

    #[test]
    fn partial_updates_merge() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        reporter.record(ProgressUpdate::total(1000));
        reporter.record(ProgressUpdate::bytes(10).with_quality("720p"));
        reporter.record(ProgressUpdate::bytes(20).with_speed(512.0));

        let snap = reporter.snapshot();
        assert_eq!(snap.bytes, 20);
        assert_eq!(snap.total, Some(1000));
        assert_eq!(snap.quality.as_deref(), Some("720p"));
        assert_eq!(snap.speed_bps, 512.0);
    }

    #[test]
    fn phase_transitions_once_and_resets_bytes() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        reporter.record(ProgressUpdate::bytes(500).with_total(500));
        assert_eq!(reporter.snapshot().phase, Phase::Downloading);

        reporter.begin_upload(500);
        let snap = reporter.snapshot();
        assert_eq!(snap.phase, Phase::Uploading);
        assert_eq!(snap.bytes, 0);
        assert_eq!(snap.total, Some(500));

        // A second transition attempt is a no-op.
        reporter.record(ProgressUpdate::bytes(100));
        reporter.begin_upload(999);
        let snap = reporter.snapshot();
        assert_eq!(snap.phase, Phase::Uploading);
        assert_eq!(snap.bytes, 100);
        assert_eq!(snap.total, Some(500));
    }

    #[test]
    fn download_tagged_updates_dropped_after_upload_begins() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        reporter.record(ProgressUpdate::bytes(900).in_phase(Phase::Downloading));
        reporter.begin_upload(100);

        // A download callback firing late must not inflate upload progress.
        reporter.record(ProgressUpdate::bytes(900).in_phase(Phase::Downloading));
        let snap = reporter.snapshot();
        assert_eq!(snap.phase, Phase::Uploading);
        assert_eq!(snap.bytes, 0);
        assert_eq!(snap.total, Some(100));

        reporter.record(ProgressUpdate::bytes(40).in_phase(Phase::Uploading));
        assert_eq!(reporter.snapshot().bytes, 40);
    }

    #[tokio::test]
    async fn no_emission_at_zero_bytes() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        let sink = CountingSink::new();
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 0);

        reporter.record(ProgressUpdate::bytes(1).with_total(10));
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn cooldown_gates_to_one_emission() {
        let reporter = ProgressReporter::new(Duration::from_secs(10));
        let sink = CountingSink::new();
        reporter.record(ProgressUpdate::bytes(1).with_total(10));

        reporter.maybe_emit(&sink).await;
        reporter.record(ProgressUpdate::bytes(2));
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn emission_resumes_after_cooldown_with_new_data() {
        let reporter = ProgressReporter::new(Duration::from_millis(30));
        let sink = CountingSink::new();

        reporter.record(ProgressUpdate::bytes(1).with_total(10));
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        reporter.record(ProgressUpdate::bytes(5));
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test]
    async fn unchanged_text_is_not_resent() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        let sink = CountingSink::new();

        reporter.record(ProgressUpdate::bytes(5).with_total(10));
        reporter.maybe_emit(&sink).await;
        reporter.maybe_emit(&sink).await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let reporter = ProgressReporter::new(Duration::ZERO);
        let sink = FailingSink {
            attempts: AtomicUsize::new(0),
        };
        reporter.record(ProgressUpdate::bytes(1));
        reporter.maybe_emit(&sink).await;
        // Should not panic, and the attempt must have happened.
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_record_access() {
        use std::thread;

        let reporter = Arc::new(ProgressReporter::new(Duration::ZERO));
        let mut handles = vec![];

        for i in 0..8u64 {
            let r = Arc::clone(&reporter);
            handles.push(thread::spawn(move || {
                for j in 0..100u64 {
                    r.record(ProgressUpdate::bytes(i * 1000 + j));
                    let _ = r.snapshot();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        // Highest recorded count wins; no panic, no deadlock.
        assert_eq!(reporter.snapshot().bytes, 7099);
    }
}
