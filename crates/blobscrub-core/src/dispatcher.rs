//! Fans a scrub out over every store and repository a controller knows.

use blobscrub_store::{ImageStore, StoreController};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScrubResult;
use crate::result::ScrubResults;
use crate::scanner::RepoScanner;

/// Drives a full scrub across a [`StoreController`].
///
/// Stores are visited default first, then sub-stores by route; within a
/// store, repositories are visited in the order the store lists them.
/// Nothing is written to any store.
#[derive(Debug, Clone, Default)]
pub struct Scrubber {
    cancel: CancellationToken,
}

impl Scrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Scrub every store, returning all rows or the first terminal error.
    pub fn check_all(&self, controller: &StoreController) -> ScrubResult<ScrubResults> {
        let mut results = ScrubResults::new();
        self.scrub_all(controller, &mut results)?;
        Ok(results)
    }

    /// Scrub every store, appending rows to `results`.
    ///
    /// Rows produced before a terminal error or cancellation stay in
    /// `results`.
    pub fn scrub_all(
        &self,
        controller: &StoreController,
        results: &mut ScrubResults,
    ) -> ScrubResult<()> {
        for (route, store) in controller.stores() {
            let route = if route.is_empty() { "/" } else { route };
            info!(route, store = store.name(), "scrubbing store");
            let before = results.len();
            self.scrub_store(store.as_ref(), results)?;
            info!(route, images = results.len() - before, "store scrubbed");
        }
        Ok(())
    }

    /// Scrub every repository of one store, appending rows to `results`.
    pub fn scrub_store(&self, store: &dyn ImageStore, results: &mut ScrubResults) -> ScrubResult<()> {
        let repos = {
            let _scope = store.lock().read()?;
            store.list_repositories()?
        };
        debug!(store = store.name(), repos = repos.len(), "listed repositories");

        let scanner = RepoScanner::new(store, &self.cancel);
        for repo in &repos {
            if let Err(err) = scanner.scan_into(repo, &mut results.scrub_results) {
                warn!(store = store.name(), repo = repo.as_str(), %err, "repository scrub aborted");
                return Err(err);
            }
        }
        Ok(())
    }
}
