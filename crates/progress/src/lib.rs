//! Rate-limited, thread-safe transfer progress reporting.
//!
//! One [`ProgressReporter`] exists per transfer. The active pipeline stage
//! feeds it partial updates via [`ProgressReporter::record`] (safe from any
//! execution context, never blocks on UI I/O), and rendered snapshots are
//! pushed through a [`ProgressSink`] at most once per cooldown window —
//! either opportunistically via [`ProgressReporter::maybe_emit`] or from a
//! [`PeriodicEmitter`] background task.

mod emitter;
mod rate;
mod render;
mod reporter;
mod state;

pub use emitter::PeriodicEmitter;
pub use render::{human_size, render_snapshot};
pub use reporter::{ProgressReporter, ProgressSink, SinkError};
pub use state::{Phase, ProgressUpdate, Snapshot};
