//! Foundation types for blobscrub.
//!
//! This crate provides the content-addressing types used throughout the
//! scrubber and re-exports the OCI image-spec model from `oci-spec`. Every
//! other blobscrub crate depends on `blobscrub-types`.
//!
//! # Key Types
//!
//! - [`Digest`] -- Content-addressed blob identifier (`sha256:<hex>`)
//! - [`Descriptor`] -- Typed reference to a blob; its digest is kept as written
//! - [`ImageIndex`] -- Repository tag list or nested multi-platform index
//! - [`ImageManifest`] -- Single-platform image: config plus ordered layers
//! - [`ImageConfiguration`] -- The image configuration blob a manifest points at

pub mod digest;
pub mod error;
pub mod oci;

pub use digest::{Algorithm, Digest, DigestHasher};
pub use error::TypeError;
pub use oci::{
    descriptor, encoded_part, index_document, parse_config, parse_index, parse_manifest,
    subject_of, Descriptor, DescriptorExt, ImageConfiguration, ImageIndex, ImageManifest,
    MediaType, ANNOTATION_REF_NAME, SCHEMA_VERSION,
};
