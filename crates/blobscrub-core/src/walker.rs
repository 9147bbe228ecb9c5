//! Memoizing traversal of the manifest / index / subject graph.
//!
//! [`ManifestWalker`] visits a descriptor, records a [`Verdict`] for its
//! digest in the repository's [`ScrubMemo`], and composes verdicts bottom-up:
//!
//! - An index is affected by its first affected child; later children are
//!   not visited.
//! - A manifest is checked by the [`IntegrityChecker`].
//! - Once a node's own checks pass, a declared subject is followed and the
//!   subject's verdict replaces the node's.
//!
//! # Invariants
//!
//! - A digest already in the memo is never fetched or checked again. Its
//!   memoized verdict is reused, even if the blob has since disappeared.
//! - A child of an index that cannot be fetched fails on its own entry
//!   only, however many indices list it.
//! - No store lock is held across a recursive call; every read is scoped
//!   on its own.
//! - Digests currently being descended into are tracked, so a store whose
//!   graph loops back on itself yields a `cycle detected` verdict instead of
//!   unbounded recursion.

use std::collections::HashSet;

use blobscrub_store::ImageStore;
use blobscrub_types::{parse_index, subject_of, Descriptor, MediaType};
use tracing::{debug, warn};

use crate::checker::IntegrityChecker;
use crate::error::NodeFault;
use crate::memo::ScrubMemo;
use crate::read::read_blob;
use crate::result::Verdict;

/// Walks one repository's manifest graph, filling a shared memo table.
pub struct ManifestWalker<'a> {
    store: &'a dyn ImageStore,
    repo: &'a str,
    memo: &'a mut ScrubMemo,
    /// Digests on the current descent path.
    in_progress: HashSet<String>,
    /// Index children whose content could not be fetched.
    unreadable: HashSet<String>,
}

impl<'a> ManifestWalker<'a> {
    pub fn new(store: &'a dyn ImageStore, repo: &'a str, memo: &'a mut ScrubMemo) -> Self {
        Self {
            store,
            repo,
            memo,
            in_progress: HashSet::new(),
            unreadable: HashSet::new(),
        }
    }

    /// The memoized verdict for a digest, if one was recorded.
    pub fn verdict(&self, digest: &str) -> Option<&Verdict> {
        self.memo.get(digest)
    }

    /// Walk a manifest or index whose content has already been fetched.
    ///
    /// `tag` only labels log output: verdicts are properties of digests.
    pub fn walk(&mut self, tag: &str, desc: &Descriptor, content: &[u8]) -> Verdict {
        let digest = desc.digest();
        if let Some(verdict) = self.memo.get(digest) {
            debug!(repo = self.repo, tag, digest = digest.as_str(), "memo hit");
            return verdict.clone();
        }

        if !self.in_progress.insert(digest.clone()) {
            warn!(repo = self.repo, tag, digest = digest.as_str(), "manifest graph cycle");
            return Verdict::affected(digest, NodeFault::CycleDetected);
        }

        let verdict = match desc.media_type() {
            MediaType::ImageIndex => self.walk_index(tag, desc, content),
            MediaType::ImageManifest => self.walk_manifest(tag, desc, content),
            other => {
                debug!(repo = self.repo, tag, media_type = %other, "unrecognized media type");
                self.record(digest, Verdict::affected(digest, NodeFault::BadManifest))
            }
        };

        self.in_progress.remove(digest);
        verdict
    }

    fn walk_index(&mut self, tag: &str, desc: &Descriptor, content: &[u8]) -> Verdict {
        let index = match parse_index(content) {
            Ok(index) => index,
            Err(err) => {
                debug!(repo = self.repo, tag, digest = desc.digest().as_str(), %err, "unparseable index");
                let verdict = Verdict::affected(desc.digest(), NodeFault::UnparseableIndex);
                return self.record(desc.digest(), verdict);
            }
        };

        for child in index.manifests() {
            let child_digest = child.digest();
            if self.unreadable.contains(child_digest) {
                continue;
            }

            let child_verdict = match self.memo.get(child_digest) {
                Some(verdict) => verdict.clone(),
                None => match read_blob(self.store, self.repo, child_digest) {
                    Ok(child_content) => self.walk(tag, child, &child_content),
                    Err(err) => {
                        debug!(repo = self.repo, tag, child = child_digest.as_str(), %err, "index child unreadable");
                        self.unreadable.insert(child_digest.clone());
                        self.record(child_digest, Verdict::affected(child_digest, err));
                        continue;
                    }
                },
            };

            if child_verdict.is_affected() {
                return self.record(desc.digest(), child_verdict);
            }
        }

        let verdict = self.record(desc.digest(), Verdict::ok());
        match subject_of(content) {
            Some(subject) => self.follow_subject(tag, desc.digest(), &subject),
            None => verdict,
        }
    }

    fn walk_manifest(&mut self, tag: &str, desc: &Descriptor, content: &[u8]) -> Verdict {
        let checker = IntegrityChecker::new(self.store, self.repo);
        let manifest = match checker.check_manifest_and_config(desc, content) {
            Ok(manifest) => manifest,
            Err(fault) => return self.record(desc.digest(), fault.into()),
        };

        let verdict = self.record(desc.digest(), checker.check_layers(&manifest));
        if verdict.is_affected() {
            return verdict;
        }
        match subject_of(content) {
            Some(subject) => self.follow_subject(tag, desc.digest(), &subject),
            None => verdict,
        }
    }

    /// Walk `owner`'s subject and let its verdict replace `owner`'s.
    fn follow_subject(&mut self, tag: &str, owner: &str, subject: &Descriptor) -> Verdict {
        let digest = subject.digest();
        let verdict = match self.memo.get(digest) {
            Some(verdict) => verdict.clone(),
            None => match read_blob(self.store, self.repo, digest) {
                Ok(content) => self.walk(tag, subject, &content),
                Err(err) => {
                    debug!(repo = self.repo, tag, subject = digest.as_str(), %err, "subject unreadable");
                    Verdict::affected(digest, err)
                }
            },
        };
        self.record(owner, verdict)
    }

    fn record(&mut self, digest: &str, verdict: Verdict) -> Verdict {
        self.memo.record(digest, verdict.clone());
        verdict
    }
}
