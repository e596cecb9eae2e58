//! Per-request transfer orchestration.
//!
//! One [`TransferOrchestrator`] instance serves the whole process; each
//! [`TransferRequest`] runs through it independently with its own progress
//! reporter and its own [`StagingArea`]. The chat platform, extraction
//! engine and storage backend are injected capabilities, so the full
//! pipeline is exercisable with mocks.
//!
//! Every acquisition, upload or staging failure is absorbed at the
//! orchestrator boundary into a [`TransferResult::Failure`] and delivered
//! through the progress sink; a request never takes the host down.

mod error;
mod naming;
mod orchestrator;
mod staging;
mod types;

pub use error::RelayError;
pub use naming::{MAX_TITLE_LEN, destination_name, sanitize_file_name};
pub use orchestrator::{RelaySettings, TransferOrchestrator};
pub use staging::{StagingArea, StagingError};
pub use types::{FailureKind, SourceKind, TransferRequest, TransferResult};
