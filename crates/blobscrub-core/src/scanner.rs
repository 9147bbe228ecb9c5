//! Per-repository scan: reads the repository's top-level index and walks
//! every tagged descriptor in it.

use blobscrub_store::ImageStore;
use blobscrub_types::{parse_index, DescriptorExt, ImageIndex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ScrubError, ScrubResult};
use crate::memo::ScrubMemo;
use crate::read::read_blob;
use crate::result::ScrubImageResult;
use crate::walker::ManifestWalker;

/// Scans repositories of one store.
pub struct RepoScanner<'a> {
    store: &'a dyn ImageStore,
    cancel: &'a CancellationToken,
}

impl<'a> RepoScanner<'a> {
    pub fn new(store: &'a dyn ImageStore, cancel: &'a CancellationToken) -> Self {
        Self { store, cancel }
    }

    /// Scan one repository, appending rows to `results` as they are produced.
    ///
    /// On cancellation this returns `Err(Cancelled)` with every row computed
    /// so far already appended. A descriptor whose manifest cannot be read is
    /// skipped without a row: it was deleted after the index was read, or its
    /// digest does not parse.
    pub fn scan_into(&self, repo: &str, results: &mut Vec<ScrubImageResult>) -> ScrubResult<()> {
        let index = self.read_index(repo)?;
        info!(repo, store = self.store.name(), tags = index.manifests().len(), "scrubbing repository");

        let mut memo = ScrubMemo::new();
        let mut walker = ManifestWalker::new(self.store, repo, &mut memo);

        for desc in index.manifests() {
            if self.cancel.is_cancelled() {
                info!(repo, done = results.len(), "scrub cancelled");
                return Err(ScrubError::Cancelled);
            }

            let tag = desc.ref_name().unwrap_or_default();
            let content = match read_blob(self.store, repo, desc.digest()) {
                Ok(content) => content,
                Err(err) => {
                    warn!(repo, tag, digest = desc.digest().as_str(), %err, "manifest unreadable, skipping");
                    continue;
                }
            };

            walker.walk(tag, desc, &content);
            if let Some(verdict) = walker.verdict(desc.digest()) {
                debug!(repo, tag, status = %verdict.status, "image scrubbed");
                results.push(verdict.clone().into_result(repo, tag));
            }
        }

        Ok(())
    }

    /// Validate the layout and parse `index.json` under one shared scope.
    fn read_index(&self, repo: &str) -> ScrubResult<ImageIndex> {
        let _scope = self.store.lock().read()?;

        if !self.store.validate_repo(repo)? {
            return Err(ScrubError::BadRepoLayout(repo.to_string()));
        }

        let content = self.store.get_index_content(repo)?;
        parse_index(&content).map_err(|_| ScrubError::RepoNotFound(repo.to_string()))
    }
}
