//! Error types for the scrubbing engine.
//!
//! Two kinds of failure exist. A [`ScrubError`] is terminal: it stops the
//! current repository (or store) and reaches the caller as `Err`. A
//! [`NodeFault`] is data-level: it is recorded in a result row and the scan
//! carries on.

use blobscrub_store::StoreError;

/// Terminal errors that abort a repository or store scan.
#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    /// The repository's layout failed validation.
    #[error("bad repository layout: {0}")]
    BadRepoLayout(String),

    /// The repository's top-level index could not be parsed.
    #[error("repository not found: {0}")]
    RepoNotFound(String),

    /// The store failed outside of a per-blob read.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The caller cancelled the scan.
    #[error("scrub cancelled")]
    Cancelled,

    /// Report serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Report output failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for scrub results.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// Per-node integrity failures, rendered into a result's `error` column.
#[derive(Debug, thiserror::Error)]
pub enum NodeFault {
    /// Unrecognized media type, or content that is not a manifest.
    #[error("bad manifest")]
    BadManifest,

    /// Config blob that is not an image configuration.
    #[error("bad config")]
    BadConfig,

    /// Nested index content that cannot be parsed.
    #[error("bad blob digest")]
    UnparseableIndex,

    /// The manifest graph loops back onto a node still being walked.
    #[error("cycle detected")]
    CycleDetected,

    /// A leaf read or digest verification failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A [`NodeFault`] attributed to a specific blob.
///
/// `blob` is the digest exactly as the referring descriptor wrote it.
#[derive(Debug, thiserror::Error)]
#[error("{blob}: {fault}")]
pub struct BlobFault {
    pub blob: String,
    pub fault: NodeFault,
}

impl BlobFault {
    pub fn new(blob: impl Into<String>, fault: impl Into<NodeFault>) -> Self {
        Self {
            blob: blob.into(),
            fault: fault.into(),
        }
    }
}
