//! In-memory LRU + TTL caching for recalculation work.
//!
//! [`LruTtlCache`] is the generic store: strict least-recently-used
//! eviction once capacity is reached, plus eager expiry of entries older
//! than the TTL at lookup time. [`RecalculationCache`] wraps it with the
//! composite content/suggestion-set/diff key so a retried or replayed
//! transition skips the O(n) delta computation.
//!
//! Sized for "recompute during this editing session": entries do not
//! survive the process, and the owning service is single-flight per
//! recalculation, so no locking is needed.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::types::{ContentDiff, DiffKind, SuggestionDelta};

/// Counters exposed for observability and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheMetrics {
    /// Fraction of lookups served from cache; 0.0 when nothing was looked
    /// up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    /// Monotonic access tick; the smallest tick is the LRU victim.
    last_access: u64,
    hit_count: u64,
}

/// Generic single-owner LRU cache with per-entry TTL expiry.
///
/// Also backs the transition-outcome cache in the orchestration crate, so
/// eviction and metrics behave identically at both layers.
#[derive(Debug)]
pub struct LruTtlCache<K, V> {
    capacity: usize,
    ttl: Duration,
    tick: u64,
    entries: HashMap<K, Entry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> LruTtlCache<K, V> {
    /// Creates a cache holding at most `capacity` entries, each valid for
    /// `ttl` after insertion.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            tick: 0,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Looks up `key`, refreshing its LRU position on a hit.
    ///
    /// An entry older than the TTL is evicted eagerly and reported as a
    /// miss — callers never observe stale values.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.evictions += 1;
            self.misses += 1;
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        entry.last_access = tick;
        entry.hit_count += 1;
        self.hits += 1;
        Some(entry.value.clone())
    }

    /// Inserts or replaces `key`, evicting the least-recently-used entry
    /// when the cache is full.
    pub fn insert(&mut self, key: K, value: V) {
        self.tick += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                last_access: self.tick,
                hit_count: 0,
            },
        );
    }

    /// Number of times `key` was served since insertion (`None` when
    /// absent). Used by tests and the metrics endpoint.
    pub fn entry_hits(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|e| e.hit_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries; counters are kept (they describe the session,
    /// not the current contents).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.entries.len(),
        }
    }

    /// Removes the entry with the oldest access tick.
    ///
    /// Linear scan — capacity is tens of entries, not thousands.
    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access)
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }
}

/// Cache of delta computations keyed by (content, suggestion ids, diffs).
#[derive(Debug)]
pub struct RecalculationCache {
    inner: LruTtlCache<String, Vec<SuggestionDelta>>,
}

impl Default for RecalculationCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_TTL)
    }
}

impl RecalculationCache {
    pub const DEFAULT_CAPACITY: usize = 50;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { inner: LruTtlCache::new(capacity, ttl) }
    }

    /// Returns the cached deltas for this exact (content, suggestion set,
    /// diff list) combination, or `None`.
    pub fn get(
        &mut self,
        content: &str,
        suggestion_ids: &[&str],
        diffs: &[ContentDiff],
    ) -> Option<Vec<SuggestionDelta>> {
        let key = recalculation_key(content, suggestion_ids, diffs);
        let found = self.inner.get(&key);
        tracing::debug!(hit = found.is_some(), "delta cache lookup");
        found
    }

    /// Stores freshly computed deltas. Only called after a successful
    /// computation, so hit and miss paths return identical results.
    pub fn set(
        &mut self,
        content: &str,
        suggestion_ids: &[&str],
        diffs: &[ContentDiff],
        deltas: Vec<SuggestionDelta>,
    ) {
        let key = recalculation_key(content, suggestion_ids, diffs);
        self.inner.insert(key, deltas);
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.inner.metrics()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

/// SHA-256 composite key over content, sorted suggestion ids, and the
/// structural fields of each diff.
///
/// Diff timestamps are excluded on purpose: a replayed transition
/// re-computes the same structural diff with a fresh timestamp and must
/// still hit. Separator bytes keep adjacent fields from aliasing.
pub fn recalculation_key(content: &str, suggestion_ids: &[&str], diffs: &[ContentDiff]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(content.as_bytes());
    hasher.update(b"\x00");

    let mut sorted_ids: Vec<&str> = suggestion_ids.to_vec();
    sorted_ids.sort_unstable();
    for id in &sorted_ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\x01");
    }
    hasher.update(b"\x00");

    for diff in diffs {
        let kind: u8 = match diff.kind {
            DiffKind::Insert => 0,
            DiffKind::Delete => 1,
            DiffKind::Replace => 2,
        };
        hasher.update([kind]);
        hasher.update((diff.start_offset as u64).to_le_bytes());
        hasher.update((diff.end_offset as u64).to_le_bytes());
        hasher.update(diff.old_text.as_bytes());
        hasher.update(b"\x01");
        hasher.update(diff.new_text.as_bytes());
        hasher.update(b"\x01");
    }

    hex::encode(hasher.finalize())
}
