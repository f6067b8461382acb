//! The `metadata.json` index: cache key -> entry

use crate::error::Result;
use crate::types::CacheMetadata;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub(crate) struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the index. A missing or corrupt file reads as an empty index;
    /// the next `save` repairs it.
    pub(crate) async fn load(&self) -> CacheMetadata {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No metadata file yet");
                return CacheMetadata::new();
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read metadata, treating as empty");
                return CacheMetadata::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Corrupt metadata, treating as empty");
                CacheMetadata::new()
            }
        }
    }

    /// Replace the whole index. Writes a sibling temp file and renames it
    /// over the old one so a crash never leaves a half-written index.
    pub(crate) async fn save(&self, metadata: &CacheMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(metadata)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, &json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = ?self.path, entries = metadata.len(), "Saved metadata");
        Ok(())
    }
}
