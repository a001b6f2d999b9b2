//! Cache for resolved function/asset maps.
//!
//! Re-deriving the maps on every evaluation would re-parse every script
//! asset, so resolved maps are memoized behind a content fingerprint of the
//! asset list. Editing any asset changes the fingerprint and the next resolve
//! re-derives; no ambient global state is involved.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use super::{AssetMap, resolve_asset_map, resolve_function_map};
use crate::model::document::DecisionModel;
use crate::script::{FunctionMap, RuntimeRegistry};

const DEFAULT_CACHE_SIZE: usize = 8;

/// The two maps the engine consumes, derived from one asset list.
pub struct ResolvedMaps {
    pub functions: FunctionMap,
    pub assets: AssetMap,
}

pub struct ResolverCache {
    entries: Mutex<LruCache<u64, Arc<ResolvedMaps>>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        let capacity =
            NonZeroUsize::new(DEFAULT_CACHE_SIZE).expect("DEFAULT_CACHE_SIZE must be > 0");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get the resolved maps for a document, deriving them on a cache miss.
    pub fn resolve(
        &self,
        model: &DecisionModel,
        runtimes: &RuntimeRegistry,
    ) -> Arc<ResolvedMaps> {
        let key = fingerprint(model);
        let mut entries = self.entries.lock().unwrap();
        if let Some(maps) = entries.get(&key) {
            return maps.clone();
        }

        let maps = Arc::new(ResolvedMaps {
            functions: resolve_function_map(&model.assets, runtimes),
            assets: resolve_asset_map(&model.assets),
        });
        entries.put(key, maps.clone());
        maps
    }
}

impl Default for ResolverCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable fingerprint of the document's asset list (its JSON form hashed).
fn fingerprint(model: &DecisionModel) -> u64 {
    let json = serde_json::to_string(&model.assets).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    hasher.finish()
}
