use std::time::Instant;

use crate::rate::RateWindow;

/// Pipeline phase of a transfer.
///
/// Transitions exactly once per transfer, `Downloading` → `Uploading`,
/// never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Downloading,
    Uploading,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Downloading => "Downloading",
            Phase::Uploading => "Uploading",
        }
    }
}

/// A partial progress update — any subset of fields may be present.
///
/// Absent fields leave the corresponding tracked value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    /// Phase this update belongs to. A stage tags its updates with the
    /// phase it runs in, so a callback outliving its stage cannot write
    /// into a later phase; untagged updates apply to whichever phase is
    /// current.
    pub phase: Option<Phase>,
    /// Cumulative bytes transferred in the current phase.
    pub bytes: Option<u64>,
    /// Total bytes, when the stage knows it (unknown totals are legal).
    pub total: Option<u64>,
    /// Engine-reported speed in bytes per second, when available.
    pub speed_bps: Option<f64>,
    /// Active quality rung label (e.g. "1080p", "audio").
    pub quality: Option<String>,
}

impl ProgressUpdate {
    /// Update carrying only a cumulative byte count.
    pub fn bytes(bytes: u64) -> Self {
        Self {
            bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// Update carrying only a known total.
    pub fn total(total: u64) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_speed(mut self, bps: f64) -> Self {
        self.speed_bps = Some(bps);
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }
}

/// Point-in-time view of the tracked progress state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub bytes: u64,
    pub total: Option<u64>,
    pub speed_bps: f64,
    pub quality: Option<String>,
}

/// Mutable per-transfer progress record, guarded by the reporter's mutex.
pub(crate) struct ProgressState {
    pub phase: Phase,
    pub bytes: u64,
    pub total: Option<u64>,
    pub speed_bps: f64,
    pub quality: Option<String>,
    pub rate: RateWindow,
    pub last_emit: Option<Instant>,
    pub last_text: Option<String>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Downloading,
            bytes: 0,
            total: None,
            speed_bps: 0.0,
            quality: None,
            rate: RateWindow::new(),
            last_emit: None,
            last_text: None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            bytes: self.bytes,
            total: self.total,
            speed_bps: self.speed_bps,
            quality: self.quality.clone(),
        }
    }
}
