//! Image-building helpers for unit tests.

use blobscrub_store::InMemoryImageStore;
use blobscrub_types::{descriptor, index_document, Descriptor, DescriptorExt, Digest, MediaType};
use serde_json::json;

pub(crate) const REPO: &str = "app";

/// Writes blobs into one repository of an in-memory store.
pub(crate) struct Images<'a> {
    pub store: &'a InMemoryImageStore,
    pub repo: &'a str,
}

impl<'a> Images<'a> {
    pub fn new(store: &'a InMemoryImageStore) -> Self {
        Self::in_repo(store, REPO)
    }

    pub fn in_repo(store: &'a InMemoryImageStore, repo: &'a str) -> Self {
        store.create_repo(repo).unwrap();
        Self { store, repo }
    }

    pub fn blob(&self, media_type: MediaType, data: &[u8]) -> Descriptor {
        let digest = self.store.put_blob(self.repo, data.to_vec()).unwrap();
        descriptor(media_type, &digest, data.len() as i64)
    }

    pub fn config(&self) -> Descriptor {
        let config = json!({
            "architecture": "amd64",
            "os": "linux",
            "rootfs": { "type": "layers", "diff_ids": [] },
            "history": []
        });
        self.blob(MediaType::ImageConfig, &serde_json::to_vec(&config).unwrap())
    }

    pub fn layer(&self, data: &[u8]) -> Descriptor {
        self.blob(MediaType::ImageLayer, data)
    }

    /// A layer whose stored bytes do not hash to its digest.
    pub fn corrupt_layer(&self, claimed: &[u8], actual: &[u8]) -> Descriptor {
        let digest = Digest::from_bytes(claimed);
        self.store
            .put_blob_as(self.repo, digest.clone(), actual.to_vec())
            .unwrap();
        descriptor(MediaType::ImageLayer, &digest, claimed.len() as i64)
    }

    pub fn manifest(&self, layers: Vec<Descriptor>) -> Descriptor {
        let config = self.config();
        self.manifest_with(config, layers, None)
    }

    pub fn manifest_with(
        &self,
        config: Descriptor,
        layers: Vec<Descriptor>,
        subject: Option<Descriptor>,
    ) -> Descriptor {
        self.blob(
            MediaType::ImageManifest,
            &manifest_document(&config, &layers, subject.as_ref()),
        )
    }

    pub fn index(&self, children: Vec<Descriptor>, subject: Option<Descriptor>) -> Descriptor {
        self.blob(
            MediaType::ImageIndex,
            &index_document(&children, subject.as_ref()).unwrap(),
        )
    }

    /// Descriptor for a blob that was never written.
    pub fn missing(&self, media_type: MediaType, seed: &[u8]) -> Descriptor {
        descriptor(media_type, &Digest::from_bytes(seed), seed.len() as i64)
    }

    /// Publish tagged descriptors as the repository's top-level index.
    pub fn publish(&self, tags: &[(&str, &Descriptor)]) {
        let manifests: Vec<_> = tags
            .iter()
            .map(|(tag, desc)| (*desc).clone().with_ref_name(tag))
            .collect();
        self.store.put_index(self.repo, &manifests).unwrap();
    }

    pub fn content(&self, desc: &Descriptor) -> Vec<u8> {
        use blobscrub_store::ImageStore;
        let digest = desc.parsed_digest().unwrap();
        self.store
            .get_blob_content(self.repo, &digest)
            .unwrap()
            .to_vec()
    }
}

/// Serialized image manifest; `subject` is omitted when `None`.
pub(crate) fn manifest_document(
    config: &Descriptor,
    layers: &[Descriptor],
    subject: Option<&Descriptor>,
) -> Vec<u8> {
    let mut doc = json!({
        "schemaVersion": 2,
        "mediaType": MediaType::ImageManifest.to_string(),
        "config": config,
        "layers": layers,
    });
    if let Some(subject) = subject {
        doc["subject"] = json!(subject);
    }
    serde_json::to_vec(&doc).unwrap()
}

/// Descriptor whose digest is written verbatim, parseable or not.
pub(crate) fn raw_descriptor(media_type: MediaType, digest: &str) -> Descriptor {
    Descriptor::new(media_type, 1, digest)
}
