//! Cache configuration

use std::path::PathBuf;
use std::time::Duration;

/// Name of the metadata index inside the cache directory
pub const METADATA_FILE: &str = "metadata.json";

/// Configuration for a [`ScreenshotCache`](crate::ScreenshotCache).
///
/// Fixed for the lifetime of the cache; construct a new cache to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding the blobs and the metadata index
    pub cache_dir: PathBuf,
    /// Lifetime of an entry from the moment it is stored
    pub max_age: Duration,
    /// Byte budget for the blob store
    pub max_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache/screenshots"),
            max_age: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            max_size: 100 * 1024 * 1024,                    // 100 MiB
        }
    }
}

impl CacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.cache_dir.join(METADATA_FILE)
    }
}
