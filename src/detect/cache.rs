// src/detect/cache.rs

//! Detection result caching
//!
//! Caches host probe results by component name so repeated planning runs do
//! not hammer the filesystem and PATH. Entries expire after a short TTL;
//! `clear()` invalidates everything immediately (used after an install run
//! changes the host state).
//!
//! The cache is an explicit, injectable object shared between detectors via
//! `Arc`, not a process-wide global.

use super::DetectionResult;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default TTL for cached detection results (5 minutes)
pub const DEFAULT_TTL_SECS: u64 = 300;

struct CacheEntry {
    result: DetectionResult,
    created_at: Instant,
}

/// Thread-safe TTL cache for detection results
pub struct DetectionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl DetectionCache {
    /// Create a cache with the given entry lifetime
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached result if present and not expired
    pub fn get(&self, component: &str) -> Option<DetectionResult> {
        {
            let entries = self.entries.read().ok()?;
            if let Some(entry) = entries.get(component) {
                if entry.created_at.elapsed() <= self.ttl {
                    return Some(entry.result.clone());
                }
            } else {
                return None;
            }
        }

        // Entry exists but expired; drop it so the map doesn't grow stale
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(component);
        }
        None
    }

    /// Store a detection result
    pub fn put(&self, result: DetectionResult) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                result.component.clone(),
                CacheEntry {
                    result,
                    created_at: Instant::now(),
                },
            );
        }
    }

    /// Drop all cached entries immediately
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of live entries (expired entries may still be counted until read)
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
