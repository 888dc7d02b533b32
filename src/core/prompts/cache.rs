//! On-disk cache of built prompts, one JSON file per mode and version.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use mode_core::Mode;
use serde::{Deserialize, Serialize};

use crate::core::storage::Storage;

/// A cached prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub version: String,
    /// Unix time in milliseconds when the entry was written.
    pub timestamp: i64,
    pub content: String,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Prompt cache with a fixed time to live.
///
/// Failures are logged and otherwise ignored: a broken cache behaves like an
/// empty one.
#[derive(Debug, Clone)]
pub struct PromptCache {
    storage: Storage,
    ttl_ms: i64,
}

impl PromptCache {
    /// Create a cache in `dir` whose entries live for `ttl`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            storage: Storage::with_root(dir.into()),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.storage.root()
    }

    fn key(mode: Mode, version: &str) -> String {
        let version: String = version
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{}-{version}", mode.short_name())
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        Utc::now().timestamp_millis().saturating_sub(timestamp) > self.ttl_ms
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        self.storage.read(&[key]).ok()
    }

    /// Fresh cached prompt, if any.
    #[must_use]
    pub fn get(&self, mode: Mode, version: &str) -> Option<String> {
        let key = Self::key(mode, version);
        let entry = self.read_entry(&key)?;
        if self.is_expired(entry.timestamp) {
            tracing::debug!(key = %key, "prompt cache entry expired");
            return None;
        }
        tracing::debug!(key = %key, "prompt cache hit");
        Some(entry.content)
    }

    /// Store a prompt.
    pub fn set(&self, mode: Mode, version: &str, content: &str) {
        let key = Self::key(mode, version);
        let entry = CacheEntry {
            version: version.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            content: content.to_string(),
        };
        if let Err(e) = self.storage.write(&[&key], &entry) {
            tracing::warn!(key = %key, error = %e, "failed to write prompt cache");
        }
    }

    /// Check if a fresh entry exists.
    #[must_use]
    pub fn has(&self, mode: Mode, version: &str) -> bool {
        self.get(mode, version).is_some()
    }

    /// Remove every cached entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let keys = match self.storage.list(&[]) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list prompt cache");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            let key: Vec<&str> = key.iter().map(String::as_str).collect();
            match self.storage.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = %e, "failed to remove prompt cache entry"),
            }
        }
        tracing::info!(removed, "prompt cache cleared");
        removed
    }

    /// Count valid and expired entries. Unreadable files count as expired.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let Ok(keys) = self.storage.list(&[]) else {
            return CacheStats::default();
        };

        let mut stats = CacheStats {
            total_entries: keys.len(),
            ..CacheStats::default()
        };
        for key in keys {
            let key: Vec<&str> = key.iter().map(String::as_str).collect();
            match self.storage.read::<CacheEntry>(&key) {
                Ok(entry) if !self.is_expired(entry.timestamp) => stats.valid_entries += 1,
                _ => stats.expired_entries += 1,
            }
        }
        stats
    }
}
