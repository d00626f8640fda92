use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use crate::cache::key::CacheKey;

/// Default capacity of each artifact cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 12;

/// Counters for one [`ArtifactCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resident entries.
    pub entries: usize,
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Successful `put` calls (including overwrites).
    pub inserts: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, Box<[u8]>>,
    // Insertion order, oldest first. Holds exactly the keys of `entries`.
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

/// Bounded, content-addressed byte cache with first-in-first-out eviction.
///
/// - Reads never affect eviction order.
/// - Overwriting an existing key replaces its payload but keeps its queue position.
/// - Payloads are copied on the way in and on the way out; callers never alias cached buffers.
/// - `get`/`put` are linearizable; racing `put`s for the same key are last-write-wins.
/// - A capacity of `0` disables storage entirely.
#[derive(Debug)]
pub struct ArtifactCache {
    name: &'static str,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ArtifactCache {
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self::named("artifact", capacity)
    }

    /// Like [`ArtifactCache::new`], with a name that tags its log events.
    pub fn named(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every mutation leaves `Inner` consistent before anything that could panic, so a
        // poisoned lock is still safe to use.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cache name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maximum number of resident entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the payload stored under `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let mut inner = self.lock();
        let found = inner.entries.get(key).map(|b| b.to_vec());
        if found.is_some() {
            inner.stats.hits += 1;
            tracing::debug!(cache = self.name, key = %key, "cache hit");
        } else {
            inner.stats.misses += 1;
            tracing::debug!(cache = self.name, key = %key, "cache miss");
        }
        found
    }

    /// Store a copy of `payload` under `key`, evicting the oldest entry when full.
    pub fn put(&self, key: CacheKey, payload: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.lock();
        let payload: Box<[u8]> = payload.into();

        if let Some(slot) = inner.entries.get_mut(&key) {
            *slot = payload;
            inner.stats.inserts += 1;
            return;
        }

        while inner.order.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.stats.evictions += 1;
            tracing::debug!(cache = self.name, key = %oldest, "cache eviction");
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, payload);
        inner.stats.inserts += 1;
    }

    /// Whether `key` is resident. Does not count as a lookup.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Resident entry count.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.lock().order.iter().cloned().collect()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats
        }
    }
}

/// The two process-lifetime caches used by the 3D pipeline.
#[derive(Debug)]
pub struct ArtifactCaches {
    /// GLB scene binaries keyed by document.
    pub scenes: ArtifactCache,
    /// Rendered PNG rasters keyed by document and raster parameters.
    pub rasters: ArtifactCache,
}

impl Default for ArtifactCaches {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_CAPACITY)
    }
}

impl ArtifactCaches {
    /// Create both caches with independent capacities.
    pub fn new(scene_capacity: usize, raster_capacity: usize) -> Self {
        Self {
            scenes: ArtifactCache::named("scene", scene_capacity),
            rasters: ArtifactCache::named("raster", raster_capacity),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/artifact.rs"]
mod tests;
