use blobscrub_types::Digest;
use bytes::Bytes;

use crate::error::StoreResult;
use crate::lock::StoreLock;

/// Read capabilities of a content-addressed image store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are addressed by digest and never change once written.
/// - Every read is independent; callers scope the shared side of
///   [`lock`](ImageStore::lock) around each read themselves.
/// - A missing blob is reported as `StoreError::BlobNotFound`, never as
///   empty content.
pub trait ImageStore: Send + Sync {
    /// Human-readable identity of this store (root path or label), for logs.
    fn name(&self) -> &str;

    /// The shared/exclusive lock guarding this store.
    fn lock(&self) -> &StoreLock;

    /// All repository names in this store, sorted.
    fn list_repositories(&self) -> StoreResult<Vec<String>>;

    /// Check a repository's on-disk layout.
    ///
    /// Returns `Ok(false)` if the repository exists but its layout is
    /// invalid, and `Err(RepoNotFound)` if it does not exist at all.
    fn validate_repo(&self, repo: &str) -> StoreResult<bool>;

    /// Raw content of a repository's top-level `index.json`.
    fn get_index_content(&self, repo: &str) -> StoreResult<Bytes>;

    /// Raw content of a blob.
    fn get_blob_content(&self, repo: &str, digest: &Digest) -> StoreResult<Bytes>;

    /// Recompute a blob's digest from its stored content.
    ///
    /// Returns `Err(BadBlobDigest)` if the content does not match.
    fn verify_blob_digest(&self, repo: &str, digest: &Digest) -> StoreResult<()>;
}
