//! Integrity scrubbing engine for content-addressed image stores.
//!
//! Walks every image reachable from a store's repositories and verifies that
//! every referenced blob still matches its digest, without mutating the
//! store. Data flows one direction:
//!
//! [`Scrubber`] -> [`RepoScanner`] -> [`ManifestWalker`] -> [`IntegrityChecker`]
//!
//! Verdicts flow back up through the walker's per-repository [`ScrubMemo`]
//! and are collected into [`ScrubResults`], which render as JSON or as a text
//! table (see [`report`]).

pub mod checker;
pub mod dispatcher;
pub mod error;
pub mod memo;
pub mod report;
pub mod result;
pub mod scanner;
pub mod walker;

mod read;

#[cfg(test)]
pub(crate) mod fixtures;

pub use checker::IntegrityChecker;
pub use dispatcher::Scrubber;
pub use error::{BlobFault, NodeFault, ScrubError, ScrubResult};
pub use memo::ScrubMemo;
pub use result::{ScrubImageResult, ScrubResults, ScrubStatus, Verdict};
pub use scanner::RepoScanner;
pub use walker::ManifestWalker;

pub use tokio_util::sync::CancellationToken;
