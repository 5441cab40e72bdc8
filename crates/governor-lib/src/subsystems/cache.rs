//! In-memory cache with essential and non-essential tiers

use super::DataCache;
use crate::policy::{CacheDirective, CachePolicy, CacheRegion};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// A cached item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub size_bytes: u64,
    /// Essential entries survive routine eviction
    pub essential: bool,
}

/// Cache shared between the governor and the code that fills it.
///
/// Clones share storage: the host inserts through one clone while the
/// governor evicts through another.
#[derive(Debug, Clone)]
pub struct TieredDataCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    policy: CachePolicy,
    /// Preloaded region entries are placeholders sized at this many bytes
    preload_size_bytes: u64,
}

impl TieredDataCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            policy: CachePolicy::Normal,
            preload_size_bytes: 64 * 1024,
        }
    }

    pub fn insert(&self, key: impl Into<String>, size_bytes: u64, essential: bool) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                size_bytes,
                essential,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.value().size_bytes).sum()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn preload(&self, region: CacheRegion) {
        let key = format!("preload:{}", region.as_str());
        if !self.entries.contains_key(&key) {
            self.insert(key, self.preload_size_bytes, false);
        }
    }
}

impl Default for TieredDataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCache for TieredDataCache {
    fn apply(&mut self, directive: &CacheDirective) {
        self.policy = directive.policy;
        if let Some(region) = directive.preload {
            self.preload(region);
        }
        debug!(policy = ?self.policy, preload = ?directive.preload, "Cache directive applied");
    }

    // Hosts may insert through another clone while these run, so only
    // entries actually rejected by `retain` are counted.
    fn evict_non_essential(&mut self) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            if !entry.essential {
                evicted += 1;
            }
            entry.essential
        });
        evicted
    }

    fn clear_all(&mut self) -> usize {
        let mut cleared = 0;
        self.entries.retain(|_, _| {
            cleared += 1;
            false
        });
        cleared
    }
}
