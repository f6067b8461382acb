//! One file per cached screenshot, named by its cache key

use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub(crate) struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub(crate) fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory and its parents if missing
    pub(crate) async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub(crate) async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path(filename)).await?)
    }

    pub(crate) async fn write(&self, filename: &str, data: &[u8]) -> Result<()> {
        fs::write(self.path(filename), data).await?;
        Ok(())
    }

    /// Remove a blob. A blob that is already gone counts as removed.
    pub(crate) async fn delete(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.path(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Byte length of a blob, or `None` when it does not exist
    pub(crate) async fn len_if_present(&self, filename: &str) -> Option<u64> {
        fs::metadata(self.path(filename))
            .await
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
    }

    /// Byte length of a blob, 0 when absent
    pub(crate) async fn size_of(&self, filename: &str) -> u64 {
        self.len_if_present(filename).await.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ensure_dir_creates_parents_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("build").join("cache").join("screenshots");
        let store = BlobStore::new(&nested);

        store.ensure_dir().await.unwrap();
        store.ensure_dir().await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_write_read_overwrite() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());

        store.write("a.png", b"first").await.unwrap();
        assert_eq!(store.read("a.png").await.unwrap(), b"first");

        store.write("a.png", b"second!").await.unwrap();
        assert_eq!(store.read("a.png").await.unwrap(), b"second!");
        assert_eq!(store.size_of("a.png").await, 7);
    }

    #[tokio::test]
    async fn test_read_missing_fails() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());

        assert!(store.read("missing.png").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());

        store.write("a.png", b"data").await.unwrap();
        store.delete("a.png").await.unwrap();
        store.delete("a.png").await.unwrap();
        assert!(!store.path("a.png").exists());
    }

    #[tokio::test]
    async fn test_size_of_missing_is_zero() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());

        assert_eq!(store.size_of("missing.png").await, 0);
        assert_eq!(store.len_if_present("missing.png").await, None);
    }
}
