//! Scrub verdicts and the result rows presented to callers.

use std::fmt;

use blobscrub_types::encoded_part;
use serde::{Deserialize, Serialize};

/// Outcome of checking one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrubStatus {
    Ok,
    Affected,
}

impl ScrubStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Affected => "affected",
        }
    }
}

impl fmt::Display for ScrubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memoized verdict for one digest.
///
/// Storage is content-addressed, so a verdict is a property of the digest
/// alone; the repository and tag are attached only when a row is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub status: ScrubStatus,
    /// Digest of the first broken blob as the referring descriptor wrote
    /// it. Set only when `status` is `Affected`.
    pub affected_blob: Option<String>,
    /// Set only when `status` is `Affected`.
    pub error: Option<String>,
}

impl Verdict {
    pub fn ok() -> Self {
        Self {
            status: ScrubStatus::Ok,
            affected_blob: None,
            error: None,
        }
    }

    pub fn affected(blob: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            status: ScrubStatus::Affected,
            affected_blob: Some(blob.into()),
            error: Some(error.to_string()),
        }
    }

    pub fn is_affected(&self) -> bool {
        self.status == ScrubStatus::Affected
    }

    /// Attach a repository and tag to produce a result row.
    pub fn into_result(self, image_name: &str, tag: &str) -> ScrubImageResult {
        ScrubImageResult {
            image_name: image_name.to_string(),
            tag: tag.to_string(),
            status: self.status,
            affected_blob: self
                .affected_blob
                .as_deref()
                .map(encoded_part)
                .unwrap_or_default()
                .to_string(),
            error: self.error.unwrap_or_default(),
        }
    }
}

impl From<crate::error::BlobFault> for Verdict {
    fn from(fault: crate::error::BlobFault) -> Self {
        Self::affected(fault.blob, fault.fault)
    }
}

/// One row of a scrub report: the verdict for a (repository, tag) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubImageResult {
    pub image_name: String,
    pub tag: String,
    pub status: ScrubStatus,
    /// Encoded (hex) part of the affected digest, or empty.
    pub affected_blob: String,
    /// Failure message, or empty.
    pub error: String,
}

impl ScrubImageResult {
    pub fn is_affected(&self) -> bool {
        self.status == ScrubStatus::Affected
    }
}

/// Ordered collection of result rows, in traversal order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubResults {
    pub scrub_results: Vec<ScrubImageResult>,
}

impl ScrubResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scrub_results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrub_results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrubImageResult> {
        self.scrub_results.iter()
    }

    /// Rows whose status is `affected`.
    pub fn affected(&self) -> impl Iterator<Item = &ScrubImageResult> {
        self.iter().filter(|r| r.is_affected())
    }
}

impl From<Vec<ScrubImageResult>> for ScrubResults {
    fn from(scrub_results: Vec<ScrubImageResult>) -> Self {
        Self { scrub_results }
    }
}

impl Extend<ScrubImageResult> for ScrubResults {
    fn extend<T: IntoIterator<Item = ScrubImageResult>>(&mut self, iter: T) {
        self.scrub_results.extend(iter);
    }
}
