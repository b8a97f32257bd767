// Loader result cache keyed by the full load request

use dashmap::DashMap;
use metrics::counter;
use std::sync::Arc;
use tracing::debug;

use crate::config::CacheConfig;
use crate::queries::{LoadRequest, SaleFact};

/// Content-addressed cache of loaded fact views.
///
/// Entries never expire on their own; any write to the sales tables must be
/// followed by [`FactCache::clear`].
#[derive(Debug, Clone)]
pub struct FactCache {
    store: Arc<DashMap<LoadRequest, Arc<Vec<SaleFact>>>>,
    capacity: usize,
    enabled: bool,
}

impl FactCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            capacity,
            enabled: true,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            capacity: 0,
            enabled: false,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.capacity)
        } else {
            Self::disabled()
        }
    }

    pub fn get(&self, key: &LoadRequest) -> Option<Arc<Vec<SaleFact>>> {
        if !self.enabled {
            return None;
        }
        match self.store.get(key) {
            Some(entry) => {
                counter!("acai_cache.hits", 1);
                debug!("Cache hit for load request: {:?}", key);
                Some(entry.value().clone())
            }
            None => {
                counter!("acai_cache.misses", 1);
                debug!("Cache miss for load request: {:?}", key);
                None
            }
        }
    }

    /// Stores a result unless the cache is disabled or full. Returns whether it was stored.
    pub fn insert(&self, key: LoadRequest, facts: Arc<Vec<SaleFact>>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.store.len() >= self.capacity && !self.store.contains_key(&key) {
            debug!(
                "Cache at capacity ({}); not admitting new load request",
                self.capacity
            );
            return false;
        }
        self.store.insert(key, facts);
        true
    }

    pub fn clear(&self) {
        let evicted = self.store.len();
        self.store.clear();
        debug!("Cleared {} cached load results", evicted);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
