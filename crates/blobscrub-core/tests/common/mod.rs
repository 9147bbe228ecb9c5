//! Repository builders shared by the integration tests, one per backend.

#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use blobscrub_core::{ScrubResults, Scrubber};
use blobscrub_store::{ImageStore, InMemoryImageStore, LocalImageStore, StoreController};
use blobscrub_types::{
    descriptor, encoded_part, index_document, Descriptor, DescriptorExt, Digest, MediaType,
};
use serde_json::json;
use tempfile::TempDir;

/// Write access to one backend, enough to lay out test images.
pub trait Backend {
    fn store(&self) -> Arc<dyn ImageStore>;
    fn init(&self, repo: &str);
    fn put(&self, repo: &str, data: &[u8]) -> Digest;
    /// Store `actual` where a blob with digest `claimed` is expected.
    fn put_corrupt(&self, repo: &str, claimed: &Digest, actual: &[u8]);
    fn delete(&self, repo: &str, digest: &Digest);
    fn set_index(&self, repo: &str, manifests: &[Descriptor]);
}

pub struct Memory(pub Arc<InMemoryImageStore>);

impl Memory {
    pub fn new() -> Self {
        Self(Arc::new(InMemoryImageStore::new()))
    }
}

impl Backend for Memory {
    fn store(&self) -> Arc<dyn ImageStore> {
        self.0.clone()
    }
    fn init(&self, repo: &str) {
        self.0.create_repo(repo).unwrap();
    }
    fn put(&self, repo: &str, data: &[u8]) -> Digest {
        self.0.put_blob(repo, data.to_vec()).unwrap()
    }
    fn put_corrupt(&self, repo: &str, claimed: &Digest, actual: &[u8]) {
        self.0.put_blob_as(repo, claimed.clone(), actual.to_vec()).unwrap();
    }
    fn delete(&self, repo: &str, digest: &Digest) {
        self.0.delete_blob(repo, digest).unwrap();
    }
    fn set_index(&self, repo: &str, manifests: &[Descriptor]) {
        self.0.put_index(repo, manifests).unwrap();
    }
}

pub struct Disk {
    pub dir: TempDir,
    pub store: Arc<LocalImageStore>,
}

impl Disk {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalImageStore::new(dir.path()));
        Self { dir, store }
    }
}

impl Backend for Disk {
    fn store(&self) -> Arc<dyn ImageStore> {
        self.store.clone()
    }
    fn init(&self, repo: &str) {
        self.store.init_repo(repo).unwrap();
    }
    fn put(&self, repo: &str, data: &[u8]) -> Digest {
        self.store.put_blob(repo, data).unwrap()
    }
    fn put_corrupt(&self, repo: &str, claimed: &Digest, actual: &[u8]) {
        let dir = self
            .dir
            .path()
            .join(repo)
            .join("blobs")
            .join(claimed.algorithm().as_str());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(claimed.encoded()), actual).unwrap();
    }
    fn delete(&self, repo: &str, digest: &Digest) {
        self.store.delete_blob(repo, digest).unwrap();
    }
    fn set_index(&self, repo: &str, manifests: &[Descriptor]) {
        self.store.put_index(repo, manifests).unwrap();
    }
}

/// Builds images inside one repository of a backend.
pub struct Repo<'a> {
    pub backend: &'a dyn Backend,
    pub name: &'a str,
}

impl<'a> Repo<'a> {
    pub fn new(backend: &'a dyn Backend, name: &'a str) -> Self {
        backend.init(name);
        Self { backend, name }
    }

    pub fn blob(&self, media_type: MediaType, data: &[u8]) -> Descriptor {
        let digest = self.backend.put(self.name, data);
        descriptor(media_type, &digest, data.len() as i64)
    }

    pub fn config(&self) -> Descriptor {
        let config = json!({
            "architecture": "arm64",
            "os": "linux",
            "rootfs": { "type": "layers", "diff_ids": [] },
            "history": []
        });
        self.blob(MediaType::ImageConfig, &serde_json::to_vec(&config).unwrap())
    }

    pub fn layer(&self, data: &[u8]) -> Descriptor {
        self.blob(MediaType::ImageLayerGzip, data)
    }

    pub fn corrupt_layer(&self, claimed: &[u8], actual: &[u8]) -> Descriptor {
        let digest = Digest::from_bytes(claimed);
        self.backend.put_corrupt(self.name, &digest, actual);
        descriptor(MediaType::ImageLayerGzip, &digest, claimed.len() as i64)
    }

    pub fn manifest(&self, layers: Vec<Descriptor>, subject: Option<Descriptor>) -> Descriptor {
        let mut manifest = json!({
            "schemaVersion": 2,
            "mediaType": MediaType::ImageManifest.to_string(),
            "config": self.config(),
            "layers": layers,
        });
        if let Some(subject) = subject {
            manifest["subject"] = json!(subject);
        }
        self.blob(MediaType::ImageManifest, &serde_json::to_vec(&manifest).unwrap())
    }

    pub fn index(&self, children: Vec<Descriptor>) -> Descriptor {
        self.blob(MediaType::ImageIndex, &index_document(&children, None).unwrap())
    }

    pub fn delete(&self, desc: &Descriptor) {
        self.backend.delete(self.name, &desc.parsed_digest().unwrap());
    }

    pub fn publish(&self, tags: &[(&str, &Descriptor)]) {
        let manifests: Vec<_> = tags
            .iter()
            .map(|(tag, desc)| (*desc).clone().with_ref_name(tag))
            .collect();
        self.backend.set_index(self.name, &manifests);
    }
}

/// A descriptor whose digest is written verbatim, parseable or not.
pub fn raw_descriptor(media_type: MediaType, digest: &str) -> Descriptor {
    Descriptor::new(media_type, 1, digest)
}

/// The hex part of a descriptor's digest, as result rows carry it.
pub fn encoded(desc: &Descriptor) -> &str {
    encoded_part(desc.digest())
}

pub fn scrub(backend: &dyn Backend) -> ScrubResults {
    Scrubber::new()
        .check_all(&StoreController::new(backend.store()))
        .unwrap()
}
