//! OCI image-layout store on the local filesystem.
//!
//! Each repository is a directory holding an `oci-layout` marker, an
//! `index.json` and a `blobs/<algorithm>/<encoded>` tree. Repository names
//! may be nested (`team/app`).

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

use blobscrub_types::{index_document, Descriptor, Digest};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{StoreError, StoreResult};
use crate::lock::StoreLock;
use crate::traits::ImageStore;

const BLOBS_DIR: &str = "blobs";
const INDEX_FILE: &str = "index.json";
const LAYOUT_FILE: &str = "oci-layout";
const LAYOUT_VERSION: &str = "1.0.0";
const VERIFY_CHUNK: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLayout {
    image_layout_version: String,
}

/// Filesystem-backed image store rooted at one directory.
#[derive(Debug)]
pub struct LocalImageStore {
    root: PathBuf,
    name: String,
    lock: StoreLock,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root.display().to_string();
        Self {
            root,
            name,
            lock: StoreLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty, valid repository layout. No-op if it exists.
    pub fn init_repo(&self, repo: &str) -> StoreResult<()> {
        let dir = self.repo_dir(repo)?;
        let _scope = self.lock.write()?;
        fs::create_dir_all(dir.join(BLOBS_DIR))?;
        let layout_path = dir.join(LAYOUT_FILE);
        if !layout_path.exists() {
            let layout = ImageLayout {
                image_layout_version: LAYOUT_VERSION.to_string(),
            };
            let data = serde_json::to_vec(&layout)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            write_atomic(&layout_path, &data)?;
        }
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            write_atomic(&index_path, &serialize_index(&[])?)?;
        }
        Ok(())
    }

    /// Write a blob under its computed digest and return the digest.
    pub fn put_blob(&self, repo: &str, data: &[u8]) -> StoreResult<Digest> {
        let digest = Digest::from_bytes(data);
        let path = self.blob_path(repo, &digest)?;
        let _scope = self.lock.write()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, data)?;
        debug!(repo, digest = %digest.short(), bytes = data.len(), "wrote blob");
        Ok(digest)
    }

    /// Replace the repository's top-level index.
    pub fn put_index(&self, repo: &str, manifests: &[Descriptor]) -> StoreResult<()> {
        let path = self.repo_dir(repo)?.join(INDEX_FILE);
        let data = serialize_index(manifests)?;
        let _scope = self.lock.write()?;
        write_atomic(&path, &data)?;
        Ok(())
    }

    /// Remove a blob file. Returns `true` if it existed.
    pub fn delete_blob(&self, repo: &str, digest: &Digest) -> StoreResult<bool> {
        let path = self.blob_path(repo, digest)?;
        let _scope = self.lock.write()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn repo_dir(&self, repo: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(repo);
        let well_formed = !repo.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StoreError::InvalidRepoName(repo.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn blob_path(&self, repo: &str, digest: &Digest) -> StoreResult<PathBuf> {
        Ok(self
            .repo_dir(repo)?
            .join(BLOBS_DIR)
            .join(digest.algorithm().as_str())
            .join(digest.encoded()))
    }

    fn open_blob(&self, repo: &str, digest: &Digest) -> StoreResult<File> {
        let path = self.blob_path(repo, digest)?;
        File::open(&path).map_err(|e| blob_error(e, digest))
    }
}

impl ImageStore for LocalImageStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> &StoreLock {
        &self.lock
    }

    fn list_repositories(&self) -> StoreResult<Vec<String>> {
        let mut repos = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_skipped(e));
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() || !looks_like_repo(entry.path()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            repos.push(name);
        }
        repos.sort();
        Ok(repos)
    }

    fn validate_repo(&self, repo: &str) -> StoreResult<bool> {
        let dir = self.repo_dir(repo)?;
        if !dir.is_dir() {
            return Err(StoreError::RepoNotFound(repo.to_string()));
        }
        if !dir.join(BLOBS_DIR).is_dir() || !dir.join(INDEX_FILE).is_file() {
            return Ok(false);
        }
        let layout = match fs::read(dir.join(LAYOUT_FILE)) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice::<ImageLayout>(&layout)
            .map(|l| l.image_layout_version == LAYOUT_VERSION)
            .unwrap_or(false))
    }

    fn get_index_content(&self, repo: &str) -> StoreResult<Bytes> {
        let path = self.repo_dir(repo)?.join(INDEX_FILE);
        match fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::RepoNotFound(repo.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_blob_content(&self, repo: &str, digest: &Digest) -> StoreResult<Bytes> {
        let mut file = self.open_blob(repo, digest)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }

    fn verify_blob_digest(&self, repo: &str, digest: &Digest) -> StoreResult<()> {
        let mut file = self.open_blob(repo, digest)?;
        let mut hasher = digest.algorithm().hasher();
        let mut buf = vec![0u8; VERIFY_CHUNK];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let actual = hasher.finalize();
        if actual != *digest {
            return Err(StoreError::BadBlobDigest {
                expected: digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0
        && entry.file_type().is_dir()
        && (name.starts_with('.') || name.starts_with('_') || name == BLOBS_DIR)
}

fn looks_like_repo(dir: &Path) -> bool {
    dir.join(INDEX_FILE).is_file() && dir.join(LAYOUT_FILE).is_file() && dir.join(BLOBS_DIR).is_dir()
}

fn serialize_index(manifests: &[Descriptor]) -> StoreResult<Vec<u8>> {
    index_document(manifests, None).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn blob_error(err: io::Error, digest: &Digest) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::BlobNotFound(digest.clone())
    } else {
        StoreError::Io(err)
    }
}

/// Write to a sibling temp file, then rename into place.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}
