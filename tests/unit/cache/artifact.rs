use super::*;
use crate::cache::key::{CacheKey, DocumentKey};

fn key(n: u32) -> CacheKey {
    CacheKey::scene(&DocumentKey(format!("{n:032x}")))
}

#[test]
fn overflow_evicts_first_inserted() {
    let cache = ArtifactCache::new(3);
    for n in 0..4 {
        cache.put(key(n), &[n as u8]);
    }
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains(&key(0)));
    assert_eq!(cache.get(&key(3)), Some(vec![3]));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn reads_do_not_promote() {
    let cache = ArtifactCache::new(2);
    cache.put(key(0), b"a");
    cache.put(key(1), b"b");
    assert!(cache.get(&key(0)).is_some());
    cache.put(key(2), b"c");
    assert!(!cache.contains(&key(0)));
    assert!(cache.contains(&key(1)));
}

#[test]
fn overwrite_keeps_queue_position() {
    let cache = ArtifactCache::new(2);
    cache.put(key(0), b"old");
    cache.put(key(1), b"b");
    cache.put(key(0), b"new");
    assert_eq!(cache.keys(), vec![key(0), key(1)]);
    assert_eq!(cache.get(&key(0)), Some(b"new".to_vec()));

    cache.put(key(2), b"c");
    assert!(!cache.contains(&key(0)));
    assert_eq!(cache.len(), 2);
}

#[test]
fn returned_payloads_are_copies() {
    let cache = ArtifactCache::new(1);
    cache.put(key(0), b"abc");
    let mut got = cache.get(&key(0)).unwrap();
    got[0] = b'z';
    assert_eq!(cache.get(&key(0)), Some(b"abc".to_vec()));
}

#[test]
fn zero_capacity_stores_nothing() {
    let cache = ArtifactCache::new(0);
    cache.put(key(0), b"a");
    assert!(cache.is_empty());
    assert_eq!(cache.get(&key(0)), None);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn stats_and_clear() {
    let cache = ArtifactCache::new(4);
    cache.put(key(0), b"a");
    let _ = cache.get(&key(0));
    let _ = cache.get(&key(9));
    let stats = cache.stats();
    assert_eq!(
        stats,
        CacheStats {
            entries: 1,
            hits: 1,
            misses: 1,
            inserts: 1,
            evictions: 0,
        }
    );

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.keys().is_empty());
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn concurrent_puts_stay_bounded() {
    let cache = std::sync::Arc::new(ArtifactCache::new(8));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for n in 0..50 {
                    cache.put(key(t * 100 + n), &[t as u8]);
                    let _ = cache.get(&key(t * 100 + n));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(cache.len(), 8);
    assert_eq!(cache.keys().len(), 8);
}

#[test]
fn caches_pair_have_independent_capacity() {
    let caches = ArtifactCaches::new(1, 2);
    assert_eq!(caches.scenes.capacity(), 1);
    assert_eq!(caches.rasters.capacity(), 2);
    assert_eq!(caches.scenes.name(), "scene");
    assert_eq!(ArtifactCaches::default().rasters.capacity(), DEFAULT_CACHE_CAPACITY);
}
