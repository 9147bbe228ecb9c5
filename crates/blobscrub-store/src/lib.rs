//! Image store interface and backends for blobscrub.
//!
//! The scrubber never touches storage directly. Everything it reads goes
//! through the [`ImageStore`] trait, so filesystem-backed stores, in-memory
//! stores and per-route sub-stores are interchangeable.
//!
//! # Storage Backends
//!
//! - [`LocalImageStore`] -- OCI image-layout directories under a root path
//! - [`InMemoryImageStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written; a blob's digest is its identity.
//! 2. Readers take the shared side of the store's [`StoreLock`] only around
//!    individual reads. Writers (pushes, garbage collection) take the
//!    exclusive side.
//! 3. A blob present when a repository was listed may be gone by the time
//!    it is fetched. Backends report that as [`StoreError::BlobNotFound`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod controller;
pub mod error;
pub mod local;
pub mod lock;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use controller::StoreController;
pub use error::{StoreError, StoreResult};
pub use local::LocalImageStore;
pub use lock::StoreLock;
pub use memory::InMemoryImageStore;
pub use traits::ImageStore;
