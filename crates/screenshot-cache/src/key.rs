//! Cache key derivation

use sha2::{Digest, Sha256};

const BLOB_EXTENSION: &str = "png";

/// Generate a cache key from the screenshot target and its dimensions
pub fn cache_key(url: &str, width: u32, height: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}-{}-{}", url, width, height).as_bytes());
    hex::encode(hasher.finalize())
}

/// On-disk blob name for a cache key
pub fn blob_filename(key: &str) -> String {
    format!("{}.{}", key, BLOB_EXTENSION)
}
