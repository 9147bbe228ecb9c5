//! Lock-scoped reads.
//!
//! Each helper takes the store's shared lock for exactly one read and
//! releases it before returning, so no lock is ever held across a recursive
//! descent. Digests arrive as the strings a descriptor carries and are
//! parsed here; a malformed one fails only the read it was meant for.

use blobscrub_store::{ImageStore, StoreResult};
use blobscrub_types::Digest;
use bytes::Bytes;

pub(crate) fn read_blob(store: &dyn ImageStore, repo: &str, digest: &str) -> StoreResult<Bytes> {
    let digest: Digest = digest.parse()?;
    let _scope = store.lock().read()?;
    store.get_blob_content(repo, &digest)
}

pub(crate) fn verify_blob(store: &dyn ImageStore, repo: &str, digest: &str) -> StoreResult<()> {
    let digest: Digest = digest.parse()?;
    let _scope = store.lock().read()?;
    store.verify_blob_digest(repo, &digest)
}
