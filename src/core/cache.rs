//! Time-to-live cache in front of repository status inspection.
//!
//! [`StatusCache`] holds one [`CacheEntry`] per repository name. All state (entries,
//! in-flight markers, counters, TTL) lives behind a single mutex, and
//! check-then-store sequences are serialized through it. The expensive
//! computation itself runs outside the lock.
//!
//! # Single-flight
//! While one caller computes a key, later callers for the same key wait for that
//! result instead of computing it again, and are counted as hits. If the computing
//! caller panics, the marker is cleared and one waiter takes over as a miss.
//!
//! # Counters
//! Hits and misses accumulate for the lifetime of the cache object; [`StatusCache::clear`]
//! drops entries only.

use crate::core::state::RepoStatus;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: RepoStatus,
    pub created_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub ttl_seconds: u64,
    /// Percentage of lookups served from the cache
    pub hit_rate: f64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashSet<String>,
    ttl: Duration,
    hits: u64,
    misses: u64,
    // results computed under an older generation are not stored
    epoch: u64,
    key_epochs: HashMap<String, u64>,
}

impl CacheInner {
    /// Generation of `name`: bumped by `clear` for every key, by `invalidate`/`insert` for one
    fn generation(&self, name: &str) -> (u64, u64) {
        (self.epoch, self.key_epochs.get(name).copied().unwrap_or(0))
    }

    fn bump(&mut self, name: &str) {
        *self.key_epochs.entry(name.to_string()).or_insert(0) += 1;
    }
}

pub struct StatusCache {
    inner: Mutex<CacheInner>,
    ready: Condvar,
    clock: Arc<dyn Clock>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                in_flight: HashSet::new(),
                ttl,
                hits: 0,
                misses: 0,
                epoch: 0,
                key_epochs: HashMap::new(),
            }),
            ready: Condvar::new(),
            clock,
        }
    }

    /// Cached status for `name` while younger than the TTL, otherwise `compute` it and store it
    pub fn get<F>(&self, name: &str, compute: F) -> RepoStatus
    where
        F: FnOnce() -> RepoStatus,
    {
        let generation = {
            let mut inner = self.inner.lock();
            loop {
                let now = self.clock.now();
                let ttl = inner.ttl;
                if let Some(entry) = inner.entries.get(name) {
                    if now.saturating_duration_since(entry.created_at) < ttl {
                        let value = entry.value.clone();
                        inner.hits += 1;
                        log::debug!("Cache hit for {name}");
                        return value;
                    }
                }
                if inner.in_flight.contains(name) {
                    self.ready.wait(&mut inner);
                    continue;
                }
                break;
            }

            inner.entries.remove(name);
            inner.misses += 1;
            inner.in_flight.insert(name.to_string());
            inner.generation(name)
        };
        log::debug!("Cache miss for {name}");

        let _flight = InFlight { cache: self, name };
        let value = compute();

        let mut inner = self.inner.lock();
        if inner.generation(name) == generation {
            inner.entries.insert(
                name.to_string(),
                CacheEntry {
                    value: value.clone(),
                    created_at: self.clock.now(),
                },
            );
        } else {
            log::debug!("{name} changed in the cache while computing; result not stored");
        }
        value
    }

    /// Store a freshly computed status without touching the hit/miss counters.
    ///
    /// A lookup for `name` already computing will not overwrite this value.
    pub fn insert(&self, name: &str, value: RepoStatus) {
        let created_at = self.clock.now();
        let mut inner = self.inner.lock();
        inner.bump(name);
        inner
            .entries
            .insert(name.to_string(), CacheEntry { value, created_at });
    }

    /// Remove one entry; returns whether it existed
    pub fn invalidate(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.bump(name);
        let removed = inner.entries.remove(name).is_some();
        log::debug!("Invalidated cache entry for {name} (present: {removed})");
        removed
    }

    /// Remove every entry; counters are kept
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        let count = inner.entries.len();
        inner.entries.clear();
        log::debug!("Cleared {count} cache entries");
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.inner.lock().ttl = ttl;
    }

    pub fn ttl(&self) -> Duration {
        self.inner.lock().ttl
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups > 0 {
            (inner.hits as f64 / lookups as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            ttl_seconds: inner.ttl.as_secs(),
            hit_rate,
        }
    }
}

/// Clears the in-flight marker and wakes waiters, also when the computation panics
struct InFlight<'a> {
    cache: &'a StatusCache,
    name: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.inner.lock().in_flight.remove(self.name);
        self.cache.ready.notify_all();
    }
}
