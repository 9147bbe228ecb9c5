use std::collections::BTreeMap;
use std::sync::Arc;

use crate::traits::ImageStore;

/// A default image store plus named sub-stores keyed by route prefix.
///
/// Sub-stores are kept in an ordered map so anything iterating
/// [`stores`](StoreController::stores) sees them in a stable order: the
/// default store first, then sub-stores by route.
#[derive(Clone)]
pub struct StoreController {
    default_store: Arc<dyn ImageStore>,
    sub_stores: BTreeMap<String, Arc<dyn ImageStore>>,
}

impl StoreController {
    pub fn new(default_store: Arc<dyn ImageStore>) -> Self {
        Self {
            default_store,
            sub_stores: BTreeMap::new(),
        }
    }

    /// Register a sub-store serving repositories under `route` (e.g. `/infra`).
    pub fn with_sub_store(mut self, route: impl Into<String>, store: Arc<dyn ImageStore>) -> Self {
        self.sub_stores.insert(route.into(), store);
        self
    }

    /// Every store with its route; the default store has the empty route.
    pub fn stores(&self) -> impl Iterator<Item = (&str, &Arc<dyn ImageStore>)> {
        std::iter::once(("", &self.default_store))
            .chain(self.sub_stores.iter().map(|(route, s)| (route.as_str(), s)))
    }
}

impl std::fmt::Debug for StoreController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreController")
            .field("default_store", &self.default_store.name())
            .field("sub_stores", &self.sub_stores.keys().collect::<Vec<_>>())
            .finish()
    }
}
