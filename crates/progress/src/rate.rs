//! Sliding-window transfer rate estimation.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Recent byte-delta observations over a bounded time window.
///
/// Lives inside the reporter's state lock, so it carries no
/// synchronization of its own. The estimate divides the bytes observed
/// after the window's first timestamp by the span the window covers;
/// a single observation has no span and yields no estimate.
pub(crate) struct RateWindow {
    window: Duration,
    cap: usize,
    observations: VecDeque<(Instant, u64)>,
}

impl RateWindow {
    const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
    const DEFAULT_CAP: usize = 128;

    pub fn new() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
            cap: Self::DEFAULT_CAP,
            observations: VecDeque::new(),
        }
    }

    /// Records `delta` newly transferred bytes at the current instant.
    pub fn observe(&mut self, delta: u64) {
        self.observe_at(Instant::now(), delta);
    }

    fn observe_at(&mut self, at: Instant, delta: u64) {
        self.observations.push_back((at, delta));
        while self.observations.len() > self.cap {
            self.observations.pop_front();
        }
        while let Some(&(t, _)) = self.observations.front() {
            if at.duration_since(t) > self.window {
                self.observations.pop_front();
            } else {
                break;
            }
        }
    }

    /// Estimated transfer rate in bytes per second over the window.
    ///
    /// The first observation only anchors the span; its bytes arrived
    /// before the window opened and are excluded from the numerator.
    pub fn per_second(&self) -> Option<f64> {
        let (first, _) = self.observations.front()?;
        let (last, _) = self.observations.back()?;
        let span = last.duration_since(*first);
        if span.is_zero() {
            return None;
        }
        let bytes: u64 = self.observations.iter().skip(1).map(|(_, b)| *b).sum();
        Some(bytes as f64 / span.as_secs_f64())
    }

    /// Forgets all observations, e.g. at a phase boundary.
    pub fn restart(&mut self) {
        self.observations.clear();
    }
}
