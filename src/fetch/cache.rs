//! Cache stores backing the fetcher.
//!
//! A store maps a [`Fingerprint`] to a [`CacheEntry`]. Stores enforce the one
//! rule that makes resumption safe: once a fingerprint holds a successful
//! entry, nothing replaces it. Failure entries are kept for auditing and are
//! overwritten by the next attempt.
//!
//! [`FsCacheStore`] lays entries out like a content-addressed store:
//!
//! ```text
//! cache_dir/
//! └── sha256/
//!     └── 3f/
//!         └── a2/
//!             └── 3fa2…e1.json
//! ```
//!
//! Writes go to a temporary file that is fsynced and renamed into place, so a
//! crash never leaves a truncated entry behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::request::Fingerprint;
use crate::error::CacheError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub status: EntryStatus,
    /// Response body on success, error description on failure.
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn success(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: EntryStatus::Success,
            body: body.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn failure(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: EntryStatus::Failure,
            body: reason.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written,
    /// A successful entry already existed and was left untouched.
    KeptExisting,
}

/// Durable key-value backend for fetched pages.
///
/// Implementations must allow concurrent readers. Callers serialize writes
/// per fingerprint, so `put` only has to be atomic with respect to crashes.
pub trait CacheStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry unless a successful one is already present.
    async fn put(
        &self,
        fingerprint: &Fingerprint,
        entry: CacheEntry,
    ) -> Result<PutOutcome, CacheError>;

    /// Manual invalidation. Returns whether an entry existed.
    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool, CacheError>;
}

/// File-system store, one JSON document per fingerprint.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        let hex = fingerprint.as_str();
        self.root
            .join("sha256")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{hex}.json"))
    }
}

impl CacheStore for FsCacheStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        match fs::read(self.path_for(fingerprint)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(level = "debug", skip_all, fields(%fingerprint, status = ?entry.status))]
    async fn put(
        &self,
        fingerprint: &Fingerprint,
        entry: CacheEntry,
    ) -> Result<PutOutcome, CacheError> {
        match self.get(fingerprint).await {
            Ok(Some(existing)) if existing.is_success() => {
                debug!("Success entry already cached; keeping it");
                return Ok(PutOutcome::KeptExisting);
            }
            Ok(_) => {}
            Err(CacheError::Json(e)) => {
                debug!(error = %e, "Overwriting unreadable cache entry");
            }
            Err(e) => return Err(e),
        }

        let path = self.path_for(fingerprint);
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!("{}.tmp-{:016x}", fingerprint, rand::random::<u64>()));
        let json = serde_json::to_vec(&entry)?;
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        // Persist the rename itself. Not every platform can open a directory
        // for syncing, so a failure here is ignored.
        if let Ok(dir_handle) = fs::File::open(&dir).await {
            let _ = dir_handle.sync_all().await;
        }
        Ok(PutOutcome::Written)
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool, CacheError> {
        match fs::remove_file(self.path_for(fingerprint)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store used by the fetcher and pipeline tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: std::sync::RwLock<std::collections::HashMap<Fingerprint, CacheEntry>>,
}

#[cfg(test)]
impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn success_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|e| e.is_success())
            .count()
    }
}

#[cfg(test)]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(fingerprint).cloned())
    }

    async fn put(
        &self,
        fingerprint: &Fingerprint,
        entry: CacheEntry,
    ) -> Result<PutOutcome, CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(fingerprint).is_some_and(CacheEntry::is_success) {
            return Ok(PutOutcome::KeptExisting);
        }
        entries.insert(fingerprint.clone(), entry);
        Ok(PutOutcome::Written)
    }

    async fn remove(&self, fingerprint: &Fingerprint) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(fingerprint).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::request::Request;

    fn fp(url: &str) -> Fingerprint {
        Request::get(url).fingerprint()
    }

    #[tokio::test]
    async fn test_fs_store_round_trip_and_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(tmp.path());
        let key = fp("https://example.org/a");

        assert_eq!(store.get(&key).await.unwrap(), None);
        let outcome = store
            .put(&key, CacheEntry::success("https://example.org/a", "<html>a</html>"))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Written);

        let hex = key.as_str();
        let expected = tmp
            .path()
            .join("sha256")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{hex}.json"));
        assert!(expected.is_file());

        let entry = store.get(&key).await.unwrap().unwrap();
        assert!(entry.is_success());
        assert_eq!(entry.body, "<html>a</html>");
    }

    #[tokio::test]
    async fn test_fs_store_never_overwrites_success() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(tmp.path());
        let key = fp("https://example.org/b");

        store
            .put(&key, CacheEntry::success("https://example.org/b", "first"))
            .await
            .unwrap();
        let outcome = store
            .put(&key, CacheEntry::failure("https://example.org/b", "503"))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::KeptExisting);
        let outcome = store
            .put(&key, CacheEntry::success("https://example.org/b", "second"))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::KeptExisting);
        assert_eq!(store.get(&key).await.unwrap().unwrap().body, "first");
    }

    #[tokio::test]
    async fn test_fs_store_failure_is_replaced_by_success() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(tmp.path());
        let key = fp("https://example.org/c");

        store
            .put(&key, CacheEntry::failure("https://example.org/c", "timeout"))
            .await
            .unwrap();
        assert!(!store.get(&key).await.unwrap().unwrap().is_success());
        store
            .put(&key, CacheEntry::success("https://example.org/c", "ok"))
            .await
            .unwrap();
        assert!(store.get(&key).await.unwrap().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_fs_store_survives_reopen_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let key = fp("https://example.org/d");
        FsCacheStore::new(tmp.path())
            .put(&key, CacheEntry::success("https://example.org/d", "persisted"))
            .await
            .unwrap();

        let reopened = FsCacheStore::new(tmp.path());
        assert_eq!(reopened.get(&key).await.unwrap().unwrap().body, "persisted");
        assert!(reopened.remove(&key).await.unwrap());
        assert!(!reopened.remove(&key).await.unwrap());
        assert_eq!(reopened.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_keeps_success() {
        let store = MemoryCacheStore::new();
        let key = fp("https://example.org/e");
        store
            .put(&key, CacheEntry::success("u", "one"))
            .await
            .unwrap();
        store
            .put(&key, CacheEntry::failure("u", "boom"))
            .await
            .unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap().body, "one");
        assert_eq!(store.len(), 1);
        assert_eq!(store.success_count(), 1);
    }
}
