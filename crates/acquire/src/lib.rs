//! Source acquisition for the relay pipeline.
//!
//! Two acquisition paths produce the same thing — a staged local file plus
//! naming metadata — while feeding the per-transfer progress reporter:
//!
//! - **Direct**: a media handle the chat platform can download for us,
//!   possibly as a container of resolution variants (largest wins).
//! - **Remote**: a URL resolved through an extraction engine, with quality
//!   negotiation against the resolved catalog before streaming to disk.
//!
//! The chat platform and the extraction engine are capabilities
//! ([`DirectSource`], [`MediaExtractor`]) implemented by the embedding
//! application, which keeps acquisition logic transport-free and testable
//! with mocks.

mod acquirer;
mod catalog;
mod direct;
mod remote;
mod staged;

pub use acquirer::{Acquired, Acquirer, SourceName};
pub use catalog::{
    FormatSelector, MediaFormat, MediaMetadata, QualityCatalog, QualityHint, QualityRung,
    infer_rung_from_name,
};
pub use direct::{ByteCallback, DirectSource, MediaHandle};
pub use remote::{DownloadProgress, MediaExtractor, ProgressCallback, RemoteOptions};
pub use staged::{StagedFile, detect_content_type};

/// Errors produced during source acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source error: {0}")]
    Source(String),

    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    #[error("media container is empty")]
    EmptyContainer,

    #[error("no qualities resolvable for {0}")]
    NoQualities(String),

    #[error("no output file found under {0}")]
    MissingOutput(String),
}
