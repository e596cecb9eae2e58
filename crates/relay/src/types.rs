//! Request and result data model.

use std::fmt;

use driveferry_acquire::{MediaHandle, QualityHint};
use serde::Deserialize;
use uuid::Uuid;

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// What to transfer and how it is located.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "sourceKind", content = "locator", rename_all = "lowercase")]
pub enum SourceKind {
    /// Media attached to a chat message, fetched through the platform.
    Direct(MediaHandle),
    /// A URL resolved through the extraction engine.
    Remote(String),
}

/// One inbound transfer request. Immutable once built.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Request identifier, generated when the payload omits one.
    #[serde(default = "new_request_id")]
    pub id: String,
    #[serde(flatten)]
    pub source: SourceKind,
    /// Quality preference for remote sources; ignored for direct ones.
    #[serde(default)]
    pub quality_hint: Option<QualityHint>,
    /// Destination folder override for this request.
    #[serde(default)]
    pub folder_hint: Option<String>,
}

impl TransferRequest {
    pub fn direct(handle: MediaHandle) -> Self {
        Self {
            id: new_request_id(),
            source: SourceKind::Direct(handle),
            quality_hint: None,
            folder_hint: None,
        }
    }

    pub fn remote(url: impl Into<String>, quality_hint: Option<QualityHint>) -> Self {
        Self {
            id: new_request_id(),
            source: SourceKind::Remote(url.into()),
            quality_hint,
            folder_hint: None,
        }
    }
}

/// Which pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Acquisition,
    Upload,
    Staging,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Acquisition => "acquisition",
            FailureKind::Upload => "upload",
            FailureKind::Staging => "staging",
        })
    }
}

/// Terminal outcome of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// Shareable link to the stored object.
    Link(String),
    Failure { kind: FailureKind, message: String },
}
