//! OCI image-spec documents, as modelled by `oci-spec`.
//!
//! Descriptor digests stay the raw strings found in the document. They are
//! parsed into a [`Digest`] only when a blob is fetched or verified, so one
//! odd digest in an index never makes the whole index unreadable.

use serde::Deserialize;
use serde_json::json;

pub use oci_spec::image::{
    Descriptor, ImageConfiguration, ImageIndex, ImageManifest, MediaType, ANNOTATION_REF_NAME,
};

use crate::digest::Digest;
use crate::error::TypeError;

/// `schemaVersion` of every image manifest and index.
pub const SCHEMA_VERSION: u32 = 2;

/// Scrubber-side accessors on an OCI [`Descriptor`].
pub trait DescriptorExt {
    /// The tag carried in the `org.opencontainers.image.ref.name` annotation.
    fn ref_name(&self) -> Option<&str>;

    /// Parse the descriptor's digest.
    fn parsed_digest(&self) -> Result<Digest, TypeError>;

    /// Copy of this descriptor annotated with a tag.
    fn with_ref_name(self, tag: &str) -> Self;
}

impl DescriptorExt for Descriptor {
    fn ref_name(&self) -> Option<&str> {
        self.annotations()
            .as_ref()?
            .get(ANNOTATION_REF_NAME)
            .map(String::as_str)
    }

    fn parsed_digest(&self) -> Result<Digest, TypeError> {
        self.digest().parse()
    }

    fn with_ref_name(mut self, tag: &str) -> Self {
        let mut annotations = self.annotations().clone().unwrap_or_default();
        annotations.insert(ANNOTATION_REF_NAME.to_string(), tag.to_string());
        self.set_annotations(Some(annotations));
        self
    }
}

/// Descriptor for a blob with a known digest.
pub fn descriptor(media_type: MediaType, digest: &Digest, size: i64) -> Descriptor {
    Descriptor::new(media_type, size, digest.to_string())
}

/// The hex part of a digest string, or the whole string when it has no
/// algorithm prefix.
pub fn encoded_part(digest: &str) -> &str {
    digest.split_once(':').map_or(digest, |(_, encoded)| encoded)
}

pub fn parse_index(content: &[u8]) -> Result<ImageIndex, TypeError> {
    serde_json::from_slice(content).map_err(|e| TypeError::Serialization(e.to_string()))
}

pub fn parse_manifest(content: &[u8]) -> Result<ImageManifest, TypeError> {
    serde_json::from_slice(content).map_err(|e| TypeError::Serialization(e.to_string()))
}

pub fn parse_config(content: &[u8]) -> Result<ImageConfiguration, TypeError> {
    serde_json::from_slice(content).map_err(|e| TypeError::Serialization(e.to_string()))
}

/// The `subject` field shared by image manifests and indices.
#[derive(Deserialize)]
struct Referrer {
    #[serde(default)]
    subject: Option<Descriptor>,
}

/// The descriptor a manifest or index declares as its subject, if any.
///
/// Returns `None` for content that is not a JSON object.
pub fn subject_of(content: &[u8]) -> Option<Descriptor> {
    serde_json::from_slice::<Referrer>(content).ok()?.subject
}

/// Serialize an image index. `subject` is omitted when `None`.
pub fn index_document(
    manifests: &[Descriptor],
    subject: Option<&Descriptor>,
) -> Result<Vec<u8>, TypeError> {
    let mut doc = json!({
        "schemaVersion": SCHEMA_VERSION,
        "mediaType": MediaType::ImageIndex.to_string(),
        "manifests": manifests,
    });
    if let Some(subject) = subject {
        doc["subject"] = json!(subject);
    }
    serde_json::to_vec(&doc).map_err(|e| TypeError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_desc(seed: &[u8]) -> Descriptor {
        descriptor(MediaType::ImageManifest, &Digest::from_bytes(seed), 7)
    }

    #[test]
    fn ref_name_round_trip() {
        let desc = manifest_desc(b"m").with_ref_name("v1.2");
        assert_eq!(desc.ref_name(), Some("v1.2"));
        assert_eq!(manifest_desc(b"m").ref_name(), None);
    }

    #[test]
    fn descriptor_json_uses_oci_field_names() {
        let desc = manifest_desc(b"m").with_ref_name("latest");
        let value = serde_json::to_value(&desc).unwrap();
        assert_eq!(value["mediaType"], "application/vnd.oci.image.manifest.v1+json");
        assert_eq!(value["size"], 7);
        assert_eq!(value["annotations"][ANNOTATION_REF_NAME], "latest");
    }

    #[test]
    fn index_keeps_unsupported_digests_as_written() {
        let raw = format!(
            r#"{{"schemaVersion":2,"manifests":[
                {{"mediaType":"application/vnd.oci.image.manifest.v1+json","digest":"sha256:{}","size":1}},
                {{"mediaType":"application/vnd.oci.image.manifest.v1+json","digest":"md5:abc","size":1}}
            ]}}"#,
            "a".repeat(64)
        );
        let index = parse_index(raw.as_bytes()).unwrap();
        assert_eq!(index.manifests().len(), 2);
        assert!(index.manifests()[0].parsed_digest().is_ok());
        assert_eq!(index.manifests()[1].digest(), "md5:abc");
        assert!(index.manifests()[1].parsed_digest().is_err());
    }

    #[test]
    fn index_document_parses_back() {
        let child = manifest_desc(b"child");
        let subject = manifest_desc(b"subject");
        let bytes = index_document(&[child.clone()], Some(&subject)).unwrap();
        let index = parse_index(&bytes).unwrap();
        assert_eq!(index.manifests(), &vec![child]);
        assert_eq!(subject_of(&bytes), Some(subject));
    }

    #[test]
    fn subject_is_optional() {
        let bytes = index_document(&[], None).unwrap();
        assert_eq!(subject_of(&bytes), None);
        assert!(!String::from_utf8(bytes).unwrap().contains("subject"));
        assert_eq!(subject_of(b"[1, 2]"), None);
    }

    #[test]
    fn encoded_part_strips_algorithm() {
        assert_eq!(encoded_part("sha384:abcd"), "abcd");
        assert_eq!(encoded_part("no-separator"), "no-separator");
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(parse_index(b"{{{").is_err());
        assert!(parse_manifest(b"{\"schemaVersion\": 2}").is_err());
        assert!(parse_config(b"[\"not\", \"an\", \"object\"]").is_err());
    }
}
