use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use blobscrub_types::{index_document, Descriptor, Digest};
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::lock::StoreLock;
use crate::traits::ImageStore;

#[derive(Debug, Clone)]
struct MemoryRepo {
    index: Option<Bytes>,
    blobs: HashMap<Digest, Bytes>,
    layout_valid: bool,
}

impl MemoryRepo {
    fn new() -> Self {
        Self {
            index: None,
            blobs: HashMap::new(),
            layout_valid: true,
        }
    }
}

/// In-memory, HashMap-based image store.
///
/// Intended for tests and embedding. Besides the read capabilities of
/// [`ImageStore`] it can store a blob under a digest that does not match its
/// content, which is how tests model on-disk corruption.
pub struct InMemoryImageStore {
    name: String,
    lock: StoreLock,
    repos: RwLock<BTreeMap<String, MemoryRepo>>,
}

impl InMemoryImageStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Create a new empty store with a label used in logs.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lock: StoreLock::new(),
            repos: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create an empty repository. No-op if it already exists.
    pub fn create_repo(&self, repo: &str) -> StoreResult<()> {
        let _scope = self.lock.write()?;
        let mut repos = self.repos.write().map_err(|_| StoreError::LockPoisoned)?;
        repos.entry(repo.to_string()).or_insert_with(MemoryRepo::new);
        Ok(())
    }

    /// Store a blob under its computed digest and return the digest.
    pub fn put_blob(&self, repo: &str, data: impl Into<Bytes>) -> StoreResult<Digest> {
        let data = data.into();
        let digest = Digest::from_bytes(&data);
        self.put_blob_as(repo, digest.clone(), data)?;
        Ok(digest)
    }

    /// Store a blob under an explicit digest, whether or not it matches.
    pub fn put_blob_as(&self, repo: &str, digest: Digest, data: impl Into<Bytes>) -> StoreResult<()> {
        self.with_repo_mut(repo, |r| {
            r.blobs.insert(digest, data.into());
        })
    }

    /// Remove a blob, as garbage collection would. Returns `true` if it existed.
    pub fn delete_blob(&self, repo: &str, digest: &Digest) -> StoreResult<bool> {
        let _scope = self.lock.write()?;
        let mut repos = self.repos.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(repos
            .get_mut(repo)
            .map(|r| r.blobs.remove(digest).is_some())
            .unwrap_or(false))
    }

    /// Replace the repository's `index.json` content verbatim.
    pub fn set_index_content(&self, repo: &str, content: impl Into<Bytes>) -> StoreResult<()> {
        self.with_repo_mut(repo, |r| r.index = Some(content.into()))
    }

    /// Serialize and store the repository's top-level index.
    pub fn put_index(&self, repo: &str, manifests: &[Descriptor]) -> StoreResult<()> {
        let content =
            index_document(manifests, None).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_index_content(repo, content)
    }

    /// Mark a repository's layout as valid or broken.
    pub fn set_layout_valid(&self, repo: &str, valid: bool) -> StoreResult<()> {
        self.with_repo_mut(repo, |r| r.layout_valid = valid)
    }

    #[cfg(test)]
    fn blob_count(&self, repo: &str) -> usize {
        self.repos
            .read()
            .map(|repos| repos.get(repo).map_or(0, |r| r.blobs.len()))
            .unwrap_or(0)
    }

    fn with_repo_mut(&self, repo: &str, f: impl FnOnce(&mut MemoryRepo)) -> StoreResult<()> {
        let _scope = self.lock.write()?;
        let mut repos = self.repos.write().map_err(|_| StoreError::LockPoisoned)?;
        f(repos.entry(repo.to_string()).or_insert_with(MemoryRepo::new));
        Ok(())
    }

    fn with_repo<T>(&self, repo: &str, f: impl FnOnce(&MemoryRepo) -> StoreResult<T>) -> StoreResult<T> {
        let repos = self.repos.read().map_err(|_| StoreError::LockPoisoned)?;
        let r = repos
            .get(repo)
            .ok_or_else(|| StoreError::RepoNotFound(repo.to_string()))?;
        f(r)
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageStore for InMemoryImageStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> &StoreLock {
        &self.lock
    }

    fn list_repositories(&self) -> StoreResult<Vec<String>> {
        let repos = self.repos.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(repos.keys().cloned().collect())
    }

    fn validate_repo(&self, repo: &str) -> StoreResult<bool> {
        self.with_repo(repo, |r| Ok(r.layout_valid && r.index.is_some()))
    }

    fn get_index_content(&self, repo: &str) -> StoreResult<Bytes> {
        self.with_repo(repo, |r| {
            r.index
                .clone()
                .ok_or_else(|| StoreError::RepoNotFound(repo.to_string()))
        })
    }

    fn get_blob_content(&self, repo: &str, digest: &Digest) -> StoreResult<Bytes> {
        self.with_repo(repo, |r| {
            r.blobs
                .get(digest)
                .cloned()
                .ok_or_else(|| StoreError::BlobNotFound(digest.clone()))
        })
    }

    fn verify_blob_digest(&self, repo: &str, digest: &Digest) -> StoreResult<()> {
        let content = self.get_blob_content(repo, digest)?;
        let actual = digest.algorithm().digest(&content);
        if actual != *digest {
            return Err(StoreError::BadBlobDigest {
                expected: digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repo_count = self.repos.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("InMemoryImageStore")
            .field("name", &self.name)
            .field("repo_count", &repo_count)
            .finish()
    }
}
