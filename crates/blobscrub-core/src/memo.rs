use std::collections::HashMap;

use crate::result::Verdict;

/// Per-repository memoization table: digest -> verdict.
///
/// Keys are digests as descriptors write them, so a digest that does not
/// parse still gets exactly one verdict.
///
/// Each digest is checked at most once per repository scan and every
/// referrer of that digest inherits its verdict. Owned by a single scan, so
/// it needs no synchronization.
#[derive(Debug, Default)]
pub struct ScrubMemo {
    verdicts: HashMap<String, Verdict>,
}

impl ScrubMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, digest: &str) -> Option<&Verdict> {
        self.verdicts.get(digest)
    }

    /// Record (or overwrite) the verdict for a digest.
    pub fn record(&mut self, digest: impl Into<String>, verdict: Verdict) {
        self.verdicts.insert(digest.into(), verdict);
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobscrub_types::Digest;

    #[test]
    fn record_overwrites() {
        let mut memo = ScrubMemo::new();
        let d = Digest::from_bytes(b"index").to_string();
        memo.record(d.as_str(), Verdict::ok());
        memo.record(d.as_str(), Verdict::affected(Digest::from_bytes(b"s"), "blob not found"));
        assert_eq!(memo.len(), 1);
        assert!(memo.get(&d).unwrap().is_affected());
    }

    #[test]
    fn empty_memo() {
        let memo = ScrubMemo::new();
        assert!(memo.is_empty());
        assert!(memo.get(&Digest::from_bytes(b"nothing").to_string()).is_none());
    }
}
