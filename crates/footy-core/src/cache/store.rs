use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A stored response together with the moment it was stored and its TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Value, stored_at: DateTime<Utc>, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at,
            ttl_ms,
        }
    }

    /// `None` when the expiry lies beyond what a timestamp can represent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = i64::try_from(self.ttl_ms).ok()?;
        self.stored_at.checked_add_signed(Duration::milliseconds(ttl))
    }

    /// Valid iff `now < stored_at + ttl`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expiry) => now < expiry,
            None => true,
        }
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.stored_at).num_minutes();
        if minutes < 1 {
            // also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Backing storage for [`TtlCache`](super::TtlCache).
///
/// Stores know nothing about expiry; they just hold entries by key.
pub trait CacheStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>>;
    fn save(&self, entry: &CacheEntry) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn len(&self) -> Result<usize>;
    /// Every stored entry, expired ones included, in no particular order.
    fn entries(&self) -> Result<Vec<CacheEntry>>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.map().get(key).cloned())
    }

    fn save(&self, entry: &CacheEntry) -> Result<()> {
        self.map().insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.map().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.map().clear();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.map().len())
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.map().values().cloned().collect())
    }
}

// ============================================================================
// File store
// ============================================================================

/// One pretty-printed JSON file per key inside `cache_dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir_entry in std::fs::read_dir(&self.cache_dir)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Escape a cache key into a file name. Keys carry `/`, `?`, `=`, `&` and `%`;
/// everything except ASCII alphanumerics and `-` becomes `_xx`.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02x}", byte));
        }
    }
    stem
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;

        let entry: CacheEntry = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", key))?;

        Ok(Some(entry))
    }

    fn save(&self, entry: &CacheEntry) -> Result<()> {
        let path = self.cache_path(&entry.key);
        let contents = serde_json::to_string_pretty(entry)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", entry.key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.cache_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for path in self.entry_files()? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entry_files()?.len())
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for path in self.entry_files()? {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
            match serde_json::from_str::<CacheEntry>(&contents) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable cache file"),
            }
        }
        Ok(entries)
    }
}

// ============================================================================
// Tests
// ============================================================================
