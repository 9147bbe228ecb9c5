use blobscrub_types::{Digest, TypeError};

/// Errors from image store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The repository does not exist in this store.
    #[error("repository not found: {0}")]
    RepoNotFound(String),

    /// The repository name is empty or escapes the store root.
    #[error("invalid repository name: {0}")]
    InvalidRepoName(String),

    /// A descriptor digest that is malformed or names an unsupported
    /// algorithm. Raised when the blob is fetched, never when the document
    /// holding the digest is parsed.
    #[error(transparent)]
    InvalidDigest(#[from] TypeError),

    /// The requested blob is not present.
    #[error("blob not found")]
    BlobNotFound(Digest),

    /// The blob's content does not hash to its digest.
    #[error("bad blob digest")]
    BadBlobDigest { expected: Digest, actual: Digest },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding a store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
