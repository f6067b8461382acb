//! File-based screenshot cache with TTL expiration and size eviction
//!
//! Stores rendered page screenshots on disk, one blob per
//! (url, width, height) triple, alongside a single `metadata.json` index.
//! Entries expire after a fixed age and the oldest entries are evicted
//! when the blob store grows past its byte budget.
//!
//! Lookups, stores, sweeps and clears on [`ScreenshotCache`] are best-effort: I/O and
//! parse failures degrade to a cache miss or a dropped write, never to an
//! error surfaced to the caller.

mod blob;
mod cache;
mod clock;
mod config;
mod error;
mod eviction;
mod key;
mod metadata;
mod types;

pub use cache::ScreenshotCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, METADATA_FILE};
pub use error::{CacheError, Result};
pub use key::{blob_filename, cache_key};
pub use types::{CacheEntry, CacheMetadata, CacheStats};
