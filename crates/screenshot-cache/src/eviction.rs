//! Expiry and size-budget sweeps
//!
//! Both sweeps are safe to run at any time and running one twice in a row
//! changes nothing the second time. A blob that cannot be deleted is logged
//! and skipped; the sweep carries on with the remaining entries.

use crate::cache::ScreenshotCache;
use crate::types::CacheMetadata;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

impl ScreenshotCache {
    /// Remove every entry whose `expires_at` has passed. Returns the number
    /// of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let _guard = self.lock.lock().await;
        let mut metadata = self.metadata.load().await;

        let removed = self.remove_expired(&mut metadata, self.clock.now()).await;
        if removed > 0 {
            self.persist(&metadata).await;
        }
        removed
    }

    /// Evict the oldest entries until the blob store fits in `max_size`.
    /// Returns the number of entries removed.
    pub async fn cleanup_if_over_budget(&self) -> usize {
        let _guard = self.lock.lock().await;
        let mut metadata = self.metadata.load().await;

        let removed = self.remove_over_budget(&mut metadata).await;
        if removed > 0 {
            self.persist(&metadata).await;
        }
        removed
    }

    pub(crate) async fn remove_expired(
        &self,
        metadata: &mut CacheMetadata,
        now: DateTime<Utc>,
    ) -> usize {
        let expired: Vec<String> = metadata
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = metadata.remove(key) {
                if let Err(e) = self.blobs.delete(&entry.filename).await {
                    warn!(key = %key, error = %e, "Failed to delete expired blob");
                }
                debug!(key = %key, url = %entry.url, "Expired cache entry");
            }
        }

        if !expired.is_empty() {
            info!(removed = expired.len(), "Removed expired screenshots");
        }
        expired.len()
    }

    pub(crate) async fn remove_over_budget(&self, metadata: &mut CacheMetadata) -> usize {
        let mut candidates = Vec::with_capacity(metadata.len());
        let mut total: u64 = 0;
        for (key, entry) in metadata.iter() {
            let len = self.blobs.len_if_present(&entry.filename).await;
            total += len.unwrap_or(0);
            candidates.push((key.clone(), entry.created_at, len));
        }

        let max_size = self.config.max_size;
        if total <= max_size {
            return 0;
        }

        // Oldest first. The sort is stable, so equal timestamps keep the
        // index's key order.
        candidates.sort_by_key(|(_, created_at, _)| *created_at);

        let mut size_to_remove = total - max_size;
        let mut evicted = Vec::new();
        for (key, _, len) in candidates {
            if size_to_remove == 0 {
                break;
            }
            // Records without a blob free nothing
            if let Some(len) = len {
                size_to_remove = size_to_remove.saturating_sub(len);
                evicted.push(key);
            }
        }

        for key in &evicted {
            if let Some(entry) = metadata.remove(key) {
                if let Err(e) = self.blobs.delete(&entry.filename).await {
                    warn!(key = %key, error = %e, "Failed to delete evicted blob");
                }
                debug!(key = %key, url = %entry.url, "Evicted oldest cache entry");
            }
        }

        info!(
            removed = evicted.len(),
            total_size = total,
            max_size,
            "Cache over budget, evicted oldest screenshots"
        );
        evicted.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::config::CacheConfig;
    use crate::key::{blob_filename, cache_key};
    use crate::types::CacheEntry;
    use crate::ScreenshotCache;
    use chrono::{DateTime, Duration};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;
    use tempfile::tempdir;

    const KIB: usize = 1024;

    fn cache_with(dir: &Path, max_size: u64, start_ms: i64) -> (ScreenshotCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::from_millis(start_ms));
        let config = CacheConfig::new(dir)
            .with_max_age(StdDuration::from_secs(3600))
            .with_max_size(max_size);
        (ScreenshotCache::with_clock(config, clock.clone()), clock)
    }

    fn total_blob_size(dir: &Path) -> u64 {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
            .map(|e| e.metadata().unwrap().len())
            .sum()
    }

    fn has_entry(dir: &Path, url: &str) -> bool {
        dir.join(blob_filename(&cache_key(url, 1200, 630))).exists()
    }

    #[tokio::test]
    async fn test_size_budget_scenario() {
        let dir = tempdir().unwrap();
        let (cache, clock) = cache_with(dir.path(), 15 * KIB as u64, 1);

        let blob = vec![0u8; 10 * KIB];
        cache.put("https://k1.example", 1200, 630, &blob).await;
        clock.set(DateTime::from_timestamp_millis(2).unwrap());
        cache.put("https://k2.example", 1200, 630, &blob).await;
        clock.set(DateTime::from_timestamp_millis(3).unwrap());
        cache.put("https://k3.example", 1200, 630, &blob).await;

        // The sweep before the third insert freed K1 only
        assert!(!has_entry(dir.path(), "https://k1.example"));
        assert!(has_entry(dir.path(), "https://k2.example"));
        assert!(has_entry(dir.path(), "https://k3.example"));

        // The insert itself may overshoot; the next sweep brings it back
        assert_eq!(cache.cleanup_if_over_budget().await, 1);
        assert!(!has_entry(dir.path(), "https://k2.example"));
        assert!(cache.get("https://k3.example", 1200, 630).await.is_some());
        assert!(total_blob_size(dir.path()) <= 15 * KIB as u64);
        assert_eq!(cache.stats().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_oldest_first_eviction() {
        let dir = tempdir().unwrap();
        // Room for all three, then shrink the budget by rebuilding the cache
        let (cache, clock) = cache_with(dir.path(), 1 << 20, 1);
        for (i, url) in ["https://a.example", "https://b.example", "https://c.example"]
            .iter()
            .enumerate()
        {
            clock.set(DateTime::from_timestamp_millis(i as i64 + 1).unwrap());
            cache.put(url, 1200, 630, &vec![1u8; 100]).await;
        }

        let (tight, _) = cache_with(dir.path(), 250, 10);
        assert_eq!(tight.cleanup_if_over_budget().await, 1);

        assert!(!has_entry(dir.path(), "https://a.example"));
        assert!(has_entry(dir.path(), "https://b.example"));
        assert!(has_entry(dir.path(), "https://c.example"));
    }

    #[tokio::test]
    async fn test_eviction_orders_by_created_at_not_key() {
        let dir = tempdir().unwrap();
        let (cache, _) = cache_with(dir.path(), 250, 0);
        cache.init().await.unwrap();

        // Keys sort "aaa" < "mmm" < "zzz" but creation order is the reverse
        let mut metadata = crate::types::CacheMetadata::new();
        for (key, created) in [("aaa", 30), ("mmm", 20), ("zzz", 10)] {
            let filename = blob_filename(key);
            std::fs::write(dir.path().join(&filename), vec![0u8; 100]).unwrap();
            metadata.insert(
                key.to_string(),
                CacheEntry {
                    url: format!("https://{}.example", key),
                    filename,
                    created_at: DateTime::from_timestamp_millis(created).unwrap(),
                    expires_at: DateTime::from_timestamp_millis(created + 1_000_000).unwrap(),
                    width: 1200,
                    height: 630,
                },
            );
        }
        cache.metadata.save(&metadata).await.unwrap();

        assert_eq!(cache.cleanup_if_over_budget().await, 1);

        let remaining = cache.metadata.load().await;
        assert!(!remaining.contains_key("zzz"));
        assert!(remaining.contains_key("mmm"));
        assert!(remaining.contains_key("aaa"));
    }

    #[tokio::test]
    async fn test_under_budget_is_noop() {
        let dir = tempdir().unwrap();
        let (cache, _) = cache_with(dir.path(), 1024, 0);

        cache.put("https://a.example", 1200, 630, &[0u8; 512]).await;
        cache.put("https://b.example", 1200, 630, &[0u8; 512]).await;

        assert_eq!(cache.cleanup_if_over_budget().await, 0);
        assert_eq!(cache.stats().await.total_entries, 2);
    }

    #[tokio::test]
    async fn test_budget_sweep_skips_records_without_blobs() {
        let dir = tempdir().unwrap();
        let (cache, clock) = cache_with(dir.path(), 1 << 20, 1);

        cache.put("https://ghost.example", 1200, 630, &[0u8; 100]).await;
        clock.advance(Duration::milliseconds(1));
        cache.put("https://a.example", 1200, 630, &[0u8; 100]).await;
        clock.advance(Duration::milliseconds(1));
        cache.put("https://b.example", 1200, 630, &[0u8; 100]).await;
        std::fs::remove_file(
            dir.path()
                .join(blob_filename(&cache_key("https://ghost.example", 1200, 630))),
        )
        .unwrap();

        let (tight, _) = cache_with(dir.path(), 150, 10);
        assert_eq!(tight.cleanup_if_over_budget().await, 1);

        let remaining = tight.metadata.load().await;
        // The ghost freed nothing, so the oldest real blob went instead
        assert!(remaining.contains_key(&cache_key("https://ghost.example", 1200, 630)));
        assert!(!remaining.contains_key(&cache_key("https://a.example", 1200, 630)));
        assert!(remaining.contains_key(&cache_key("https://b.example", 1200, 630)));
        assert!(total_blob_size(dir.path()) <= 150);
    }

    #[tokio::test]
    async fn test_budget_sweep_always_converges() {
        let dir = tempdir().unwrap();
        let (cache, clock) = cache_with(dir.path(), 1 << 20, 0);
        for i in 0..8u32 {
            clock.advance(Duration::milliseconds(1));
            cache
                .put("https://example.com", 100 + i, 100, &vec![0u8; 37 * (i as usize + 1)])
                .await;
        }

        for budget in [900u64, 500, 100, 1, 0] {
            let (tight, _) = cache_with(dir.path(), budget, 100);
            tight.cleanup_if_over_budget().await;
            assert!(total_blob_size(dir.path()) <= budget);
            // Second run has nothing left to do
            assert_eq!(tight.cleanup_if_over_budget().await, 0);
        }
    }

    #[tokio::test]
    async fn test_cleanup_expired_keeps_live_entries() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::from_millis(0));
        let config = CacheConfig::new(dir.path()).with_max_age(StdDuration::from_millis(100));
        let cache = ScreenshotCache::with_clock(config, clock.clone());

        cache.put("https://old.example", 1200, 630, b"old").await;
        clock.advance(Duration::milliseconds(60));
        cache.put("https://new.example", 1200, 630, b"new").await;
        clock.advance(Duration::milliseconds(60));

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.cleanup_expired().await, 0);

        assert!(!has_entry(dir.path(), "https://old.example"));
        assert!(has_entry(dir.path(), "https://new.example"));
        assert_eq!(cache.metadata.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired_tolerates_missing_blob() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::from_millis(0));
        let config = CacheConfig::new(dir.path()).with_max_age(StdDuration::from_millis(10));
        let cache = ScreenshotCache::with_clock(config, clock.clone());

        cache.put("https://a.example", 1200, 630, b"a").await;
        cache.put("https://b.example", 1200, 630, b"b").await;
        std::fs::remove_file(
            dir.path()
                .join(blob_filename(&cache_key("https://a.example", 1200, 630))),
        )
        .unwrap();
        clock.advance(Duration::milliseconds(10));

        assert_eq!(cache.cleanup_expired().await, 2);
        assert!(cache.metadata.load().await.is_empty());
        assert_eq!(total_blob_size(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_equal_created_at_evicts_lower_key_first() {
        let dir = tempdir().unwrap();
        let (cache, _) = cache_with(dir.path(), 150, 0);
        cache.init().await.unwrap();

        // Inserted high key first so insertion order disagrees with key order
        let mut metadata = crate::types::CacheMetadata::new();
        for key in ["bbb", "aaa"] {
            let filename = blob_filename(key);
            std::fs::write(dir.path().join(&filename), vec![0u8; 100]).unwrap();
            metadata.insert(
                key.to_string(),
                CacheEntry {
                    url: format!("https://{}.example", key),
                    filename,
                    created_at: DateTime::from_timestamp_millis(7).unwrap(),
                    expires_at: DateTime::from_timestamp_millis(1_000_007).unwrap(),
                    width: 1200,
                    height: 630,
                },
            );
        }
        cache.metadata.save(&metadata).await.unwrap();

        assert_eq!(cache.cleanup_if_over_budget().await, 1);

        let remaining = cache.metadata.load().await;
        assert!(!remaining.contains_key("aaa"));
        assert!(remaining.contains_key("bbb"));
        assert!(!dir.path().join(blob_filename("aaa")).exists());
    }
}
