//! Public cache operations

use crate::blob::BlobStore;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::{blob_filename, cache_key};
use crate::metadata::MetadataStore;
use crate::types::{CacheEntry, CacheMetadata, CacheStats};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A screenshot cache backed by one file per entry and a JSON index.
///
/// Each operation loads the index, mutates it in memory and writes it back
/// whole. A per-cache mutex serializes those sequences inside one process;
/// separate processes sharing a directory fall back to last-write-wins.
pub struct ScreenshotCache {
    pub(crate) config: CacheConfig,
    pub(crate) blobs: BlobStore,
    pub(crate) metadata: MetadataStore,
    pub(crate) clock: Arc<dyn Clock>,
    max_age: TimeDelta,
    /// Guards every load/mutate/save of the index
    pub(crate) lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ScreenshotCache {
    /// Create a new cache using the wall clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        // Entries must outlive their creation instant, even at ms resolution
        let max_age = TimeDelta::from_std(config.max_age)
            .unwrap_or(TimeDelta::MAX)
            .max(TimeDelta::milliseconds(1));
        Self {
            blobs: BlobStore::new(&config.cache_dir),
            metadata: MetadataStore::new(config.metadata_path()),
            config,
            clock,
            max_age,
            lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Initialize the cache by ensuring the cache directory exists
    pub async fn init(&self) -> Result<()> {
        self.blobs.ensure_dir().await?;
        info!(cache_dir = ?self.blobs.dir(), "Screenshot cache initialized");
        Ok(())
    }

    /// Look up a screenshot. Expired entries are swept first; any failure
    /// along the way is reported as a miss.
    pub async fn get(&self, url: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        let _guard = self.lock.lock().await;

        if let Err(e) = self.blobs.ensure_dir().await {
            warn!(error = %e, "Cache directory unavailable");
            return self.miss();
        }

        let now = self.clock.now();
        let mut metadata = self.metadata.load().await;
        if self.remove_expired(&mut metadata, now).await > 0 {
            self.persist(&metadata).await;
        }

        let key = cache_key(url, width, height);
        let entry = match metadata.get(&key) {
            Some(entry) if !entry.is_expired(now) => entry,
            _ => {
                debug!(key = %key, url, "Cache miss");
                return self.miss();
            }
        };

        match self.blobs.read(&entry.filename).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, url, size = data.len(), "Cache hit");
                Some(data)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached screenshot");
                self.miss()
            }
        }
    }

    /// Store a screenshot, replacing any previous entry for the same
    /// (url, width, height). Runs the size sweep before writing. Failures
    /// are logged and the screenshot is simply not cached.
    pub async fn put(&self, url: &str, width: u32, height: u32, data: &[u8]) {
        let _guard = self.lock.lock().await;

        if let Err(e) = self.blobs.ensure_dir().await {
            warn!(error = %e, "Cache directory unavailable, not caching");
            return;
        }

        let mut metadata = self.metadata.load().await;
        let evicted = self.remove_over_budget(&mut metadata).await;

        let key = cache_key(url, width, height);
        let filename = blob_filename(&key);

        if let Err(e) = self.blobs.write(&filename, data).await {
            warn!(key = %key, url, error = %e, "Failed to write screenshot blob");
            if evicted > 0 {
                self.persist(&metadata).await;
            }
            return;
        }

        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.max_age)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        metadata.insert(
            key.clone(),
            CacheEntry {
                url: url.to_string(),
                filename,
                created_at,
                expires_at,
                width,
                height,
            },
        );
        if !self.persist(&metadata).await {
            // Nothing will ever reference the blob, so don't leave it behind
            if let Err(e) = self.blobs.delete(&blob_filename(&key)).await {
                warn!(key = %key, error = %e, "Failed to remove unindexed blob");
            }
            return;
        }

        debug!(key = %key, url, size = data.len(), "Cached screenshot");
    }

    /// Entry count and blob-store size. Does not evict anything.
    pub async fn stats(&self) -> CacheStats {
        let _guard = self.lock.lock().await;
        let metadata = self.metadata.load().await;

        let mut total_size = 0;
        for entry in metadata.values() {
            total_size += self.blobs.size_of(&entry.filename).await;
        }

        CacheStats {
            total_entries: metadata.len(),
            total_size,
            max_size: self.config.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry regardless of age or size. Returns how many
    /// entries were removed.
    pub async fn clear(&self) -> usize {
        let _guard = self.lock.lock().await;
        let metadata = self.metadata.load().await;

        for (key, entry) in &metadata {
            if let Err(e) = self.blobs.delete(&entry.filename).await {
                warn!(key = %key, error = %e, "Failed to delete blob during clear");
            }
        }

        if let Err(e) = self.blobs.ensure_dir().await {
            warn!(error = %e, "Cache directory unavailable");
        }
        self.persist(&CacheMetadata::new()).await;

        info!(removed = metadata.len(), "Screenshot cache cleared");
        metadata.len()
    }

    /// Write the index, logging instead of failing. Returns whether the
    /// write succeeded.
    pub(crate) async fn persist(&self, metadata: &CacheMetadata) -> bool {
        match self.metadata.save(metadata).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save cache metadata");
                false
            }
        }
    }

    fn miss(&self) -> Option<Vec<u8>> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }
}
