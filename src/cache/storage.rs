//! Cache storage trait and file system implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::entry::CacheEntry;
use crate::config;
use crate::error::{Error, Result};

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Look up an entry. Absent and unreadable entries are both `None`.
  fn get(&self, key: &str) -> Option<CacheEntry>;

  /// Store `raw` (a JSON response body) under `key`, replacing any prior entry.
  fn save(&self, key: &str, etag: &str, raw: &[u8]) -> Result<()>;

  /// Drop every entry.
  fn purge(&self) -> Result<()>;
}

impl<T: CacheStorage + ?Sized> CacheStorage for Box<T> {
  fn get(&self, key: &str) -> Option<CacheEntry> {
    (**self).get(key)
  }

  fn save(&self, key: &str, etag: &str, raw: &[u8]) -> Result<()> {
    (**self).save(key, etag, raw)
  }

  fn purge(&self) -> Result<()> {
    (**self).purge()
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Option<CacheEntry> {
    None // Always miss
  }

  fn save(&self, _key: &str, _etag: &str, _raw: &[u8]) -> Result<()> {
    Ok(()) // Discard
  }

  fn purge(&self) -> Result<()> {
    Ok(())
  }
}

/// One JSON file per key inside a single directory.
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  /// Open the storage at the default per-user cache location.
  pub fn open() -> Result<Self> {
    Self::open_at(config::cache_dir()?)
  }

  /// Open (creating if needed) the storage rooted at `dir`.
  pub fn open_at(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir).map_err(|e| {
      Error::Cache(format!(
        "Failed to create cache directory {}: {}",
        dir.display(),
        e
      ))
    })?;

    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn entry_path(&self, key: &str) -> PathBuf {
    self.dir.join(key)
  }
}

impl CacheStorage for FileStorage {
  fn get(&self, key: &str) -> Option<CacheEntry> {
    let path = self.entry_path(key);

    let bytes = match std::fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return None,
      Err(e) => {
        warn!("Failed to read cache entry {}: {}", path.display(), e);
        return None;
      }
    };

    match serde_json::from_slice(&bytes) {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
        None
      }
    }
  }

  fn save(&self, key: &str, etag: &str, raw: &[u8]) -> Result<()> {
    let data: serde_json::Value = serde_json::from_slice(raw)
      .map_err(|e| Error::Cache(format!("Response body for {} is not JSON: {}", key, e)))?;

    let entry = CacheEntry {
      etag: etag.to_string(),
      data,
    };
    let contents = serde_json::to_vec(&entry)
      .map_err(|e| Error::Cache(format!("Failed to serialize cache entry: {}", e)))?;

    let path = self.entry_path(key);
    std::fs::write(&path, contents).map_err(|e| {
      Error::Cache(format!(
        "Failed to write cache entry {}: {}",
        path.display(),
        e
      ))
    })?;

    debug!(key, etag, "Saved cache entry");
    Ok(())
  }

  fn purge(&self) -> Result<()> {
    match std::fs::remove_dir_all(&self.dir) {
      Ok(()) => {}
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => {
        return Err(Error::Cache(format!(
          "Failed to remove cache directory {}: {}",
          self.dir.display(),
          e
        )))
      }
    }

    std::fs::create_dir_all(&self.dir).map_err(|e| {
      Error::Cache(format!(
        "Failed to recreate cache directory {}: {}",
        self.dir.display(),
        e
      ))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const EXISTING_KEY: &str = "20c22a082fcce4ece7a64f692d9a86fd0f9f06b2";

  fn storage() -> (tempfile::TempDir, FileStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open_at(dir.path().join("zube")).unwrap();
    (dir, storage)
  }

  #[test]
  fn test_get_missing_key_is_none() {
    let (_dir, storage) = storage();
    assert_eq!(storage.get("somenonexistentkey"), None);
  }

  #[test]
  fn test_get_existing_entry() {
    let (_dir, storage) = storage();
    std::fs::write(
      storage.dir().join(EXISTING_KEY),
      r#"{"etag":"4b61-KvCvo1XgbWyNb1RjJY6Ci2/Z0DA","data":"peko"}"#,
    )
    .unwrap();

    assert_eq!(
      storage.get(EXISTING_KEY),
      Some(CacheEntry {
        etag: "4b61-KvCvo1XgbWyNb1RjJY6Ci2/Z0DA".into(),
        data: json!("peko"),
      })
    );
  }

  #[test]
  fn test_save_then_get() {
    let (_dir, storage) = storage();
    let body = br#"{"page":1,"total":1,"data":[{"id":7,"title":"Fix login"}]}"#;

    storage.save(EXISTING_KEY, "etag-1", body).unwrap();

    let entry = storage.get(EXISTING_KEY).unwrap();
    assert_eq!(entry.etag, "etag-1");
    assert_eq!(
      entry.data,
      json!({"page": 1, "total": 1, "data": [{"id": 7, "title": "Fix login"}]})
    );
  }

  #[test]
  fn test_save_overwrites() {
    let (_dir, storage) = storage();
    storage.save("k", "old", br#"{"v":1}"#).unwrap();
    storage.save("k", "new", br#"{"v":2}"#).unwrap();

    let entry = storage.get("k").unwrap();
    assert_eq!(entry.etag, "new");
    assert_eq!(entry.data, json!({"v": 2}));
  }

  #[test]
  fn test_save_rejects_non_json_body() {
    let (_dir, storage) = storage();
    assert!(matches!(
      storage.save("k", "e", b"<html>oops</html>"),
      Err(Error::Cache(_))
    ));
    assert_eq!(storage.get("k"), None);
  }

  #[test]
  fn test_corrupt_entry_degrades_to_miss() {
    let (_dir, storage) = storage();
    std::fs::write(storage.dir().join("k"), "not json").unwrap();
    assert_eq!(storage.get("k"), None);
  }

  #[test]
  fn test_purge_empties_directory() {
    let (_dir, storage) = storage();
    storage.save("a", "e", b"1").unwrap();
    storage.save("b", "e", b"2").unwrap();

    storage.purge().unwrap();

    assert!(storage.dir().is_dir());
    assert_eq!(std::fs::read_dir(storage.dir()).unwrap().count(), 0);
    assert_eq!(storage.get("a"), None);
  }

  #[test]
  fn test_noop_storage_never_hits() {
    let storage = NoopStorage;
    storage.save("k", "e", b"{}").unwrap();
    assert_eq!(storage.get("k"), None);
  }
}
