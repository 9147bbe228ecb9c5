//! Integrity checks for a single image manifest.
//!
//! A manifest passes when it is a well-formed image manifest, its config
//! blob is readable and parses as an image configuration, and every layer
//! verifies against its digest. Checking stops at the first failure, in
//! that order, so a manifest's verdict always names the first broken blob.

use blobscrub_store::ImageStore;
use blobscrub_types::{parse_config, parse_manifest, Descriptor, ImageManifest, MediaType};
use tracing::debug;

use crate::error::{BlobFault, NodeFault};
use crate::read::{read_blob, verify_blob};
use crate::result::Verdict;

/// Verifies one manifest and the blobs it references. Read-only.
pub struct IntegrityChecker<'a> {
    store: &'a dyn ImageStore,
    repo: &'a str,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(store: &'a dyn ImageStore, repo: &'a str) -> Self {
        Self { store, repo }
    }

    /// Run every check against an already-fetched manifest.
    pub fn check(&self, desc: &Descriptor, content: &[u8]) -> Verdict {
        match self.check_manifest_and_config(desc, content) {
            Ok(manifest) => self.check_layers(&manifest),
            Err(fault) => fault.into(),
        }
    }

    /// Validate the manifest itself and its config blob.
    ///
    /// Returns the parsed manifest so callers can follow its subject
    /// without parsing it again.
    pub fn check_manifest_and_config(
        &self,
        desc: &Descriptor,
        content: &[u8],
    ) -> Result<ImageManifest, BlobFault> {
        if *desc.media_type() != MediaType::ImageManifest {
            return Err(BlobFault::new(desc.digest(), NodeFault::BadManifest));
        }

        let manifest = parse_manifest(content)
            .map_err(|_| BlobFault::new(desc.digest(), NodeFault::BadManifest))?;

        let config_digest = manifest.config().digest();
        let config = read_blob(self.store, self.repo, config_digest)
            .map_err(|e| BlobFault::new(config_digest, e))?;
        parse_config(&config).map_err(|_| BlobFault::new(config_digest, NodeFault::BadConfig))?;

        Ok(manifest)
    }

    /// Verify layers in listed order, stopping at the first failure.
    pub fn check_layers(&self, manifest: &ImageManifest) -> Verdict {
        for layer in manifest.layers() {
            if let Err(err) = verify_blob(self.store, self.repo, layer.digest()) {
                debug!(repo = self.repo, layer = %layer.digest(), %err, "layer failed verification");
                return Verdict::affected(layer.digest(), err);
            }
        }
        Verdict::ok()
    }
}
