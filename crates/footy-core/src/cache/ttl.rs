use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{CacheEntry, CacheKey, CacheStore, Clock, MemoryStore, SystemClock};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("TTL must be at least one millisecond")]
    InvalidTtl,

    #[error("Cache storage error: {0}")]
    Storage(String),
}

/// Counters for the lifetime of one `TtlCache`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub writes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    writes: AtomicU64,
}

/// Key → JSON payload cache with per-entry time-to-live.
///
/// `get` and `set` are synchronous and never hold a lock across an await.
/// Construct one per process and share it through an `Arc`.
pub struct TtlCache {
    store: Box<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl TtlCache {
    pub fn new(store: impl CacheStore + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Box::new(store),
            clock,
            counters: Counters::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), Arc::new(SystemClock))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the cached value if it has not expired. Expired entries are
    /// removed on the way out. Unreadable entries count as absent.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let entry = match self.store.load(key.as_str()) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry, treating as absent");
                None
            }
        };

        let Some(entry) = entry else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entry.is_valid_at(self.clock.now()) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value);
        }

        debug!(key = %key, "Cache entry expired");
        self.counters.expired.fetch_add(1, Ordering::Relaxed);
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.store.remove(key.as_str()) {
            warn!(key = %key, error = %e, "Failed to evict expired cache entry");
        }
        None
    }

    /// Like `get`, but leaves the counters and the store untouched.
    pub fn peek(&self, key: &CacheKey) -> Option<Value> {
        let entry = self.store.load(key.as_str()).ok().flatten()?;
        entry.is_valid_at(self.clock.now()).then_some(entry.value)
    }

    /// Stored entries sorted by key, expired ones included.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries = self
            .store
            .entries()
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Insert or overwrite `key`. The entry is stamped with the current time.
    pub fn set(&self, key: &CacheKey, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if ttl_ms == 0 {
            return Err(CacheError::InvalidTtl);
        }

        let entry = CacheEntry::new(key.as_str(), value, self.clock.now(), ttl_ms);
        self.store
            .save(&entry)
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.store
            .remove(key.as_str())
            .map_err(|e| CacheError::Storage(e.to_string()))
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().map_err(|e| CacheError::Storage(e.to_string()))
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> Result<usize, CacheError> {
        self.store.len().map_err(|e| CacheError::Storage(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
