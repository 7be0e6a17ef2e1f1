// src/dedup/file.rs
//! JSON-file store. Every mutation rewrites the document through a temp file
//! and a rename, so a crash leaves either the old or the new state. A
//! `<state>.lock` file keeps a second run from writing the same state.

use chrono::Utc;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

use super::store::{ClaimOutcome, ClaimToken, ProcessedStore, StateDoc};
use crate::error::StoreError;

/// Lock older than this is considered left over from a crashed run.
pub const DEFAULT_STALE_LOCK: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf, stale_after: Duration) -> Result<Self, StoreError> {
        match Self::create(&path) {
            Ok(l) => Ok(l),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let age = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|t| SystemTime::now().duration_since(t).ok())
                    .unwrap_or_default();
                if age < stale_after {
                    return Err(StoreError::Locked {
                        path: path.display().to_string(),
                    });
                }
                tracing::warn!(
                    target: "dedup",
                    lock = %path.display(),
                    age_secs = age.as_secs(),
                    "breaking stale state lock"
                );
                std::fs::remove_file(&path)?;
                Ok(Self::create(&path)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut f = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        writeln!(f, "{} {}", std::process::id(), Utc::now().to_rfc3339())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<StateDoc>,
    _lock: LockFile,
}

impl JsonFileStore {
    /// Open (or create) the state file. Any failure here is fatal for a run.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(path, DEFAULT_STALE_LOCK).await
    }

    pub async fn open_with(
        path: impl Into<PathBuf>,
        stale_lock_after: Duration,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let lock = LockFile::acquire(sibling(&path, "lock"), stale_lock_after)?;

        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => StateDoc::default(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateDoc::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            target: "dedup",
            path = %path.display(),
            posted = doc.posted_count(),
            pending = doc.claims().len(),
            "state opened"
        );

        Ok(Self {
            path,
            doc: Mutex::new(doc),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, doc: &StateDoc) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = sibling(&self.path, "tmp");
        {
            let mut f = tokio::fs::File::create(&tmp).await?;
            tokio::io::AsyncWriteExt::write_all(&mut f, &bytes).await?;
            f.sync_all().await?;
        }
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `f` to a copy; the in-memory state only moves once the file did.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StateDoc) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.doc.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if next != *guard {
            self.persist(&next).await?;
            *guard = next;
        }
        Ok(out)
    }
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[async_trait::async_trait]
impl ProcessedStore for JsonFileStore {
    async fn try_claim(
        &self,
        thread_id: &str,
        token: &ClaimToken,
    ) -> Result<ClaimOutcome, StoreError> {
        self.mutate(|d| Ok(d.claim(thread_id, token))).await
    }

    async fn commit(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        self.mutate(|d| d.commit(thread_id, token)).await
    }

    async fn release(&self, thread_id: &str, token: &ClaimToken) -> Result<(), StoreError> {
        self.mutate(|d| d.release(thread_id, token)).await
    }

    async fn pending_claims(&self) -> Result<Vec<(String, ClaimToken)>, StoreError> {
        Ok(self.doc.lock().await.claims())
    }

    async fn is_processed(&self, thread_id: &str) -> Result<bool, StoreError> {
        Ok(self.doc.lock().await.is_posted(thread_id))
    }

    async fn processed_count(&self) -> Result<usize, StoreError> {
        Ok(self.doc.lock().await.posted_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state/processed.json");
        let t = ClaimToken("tok".into());
        {
            let s = JsonFileStore::open(&path).await.unwrap();
            assert_eq!(s.try_claim("a", &t).await.unwrap(), ClaimOutcome::Claimed);
            s.commit("a", &t).await.unwrap();
            s.try_claim("b", &t).await.unwrap();
        }
        let s = JsonFileStore::open(&path).await.unwrap();
        assert!(s.is_processed("a").await.unwrap());
        assert!(!s.is_processed("b").await.unwrap());
        assert_eq!(s.pending_claims().await.unwrap(), vec![("b".to_string(), t)]);
    }

    #[tokio::test]
    async fn second_open_is_locked_out() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed.json");
        let _first = JsonFileStore::open(&path).await.unwrap();
        let second = JsonFileStore::open(&path).await;
        assert!(matches!(second, Err(StoreError::Locked { .. })));
    }

    #[tokio::test]
    async fn stale_lock_is_broken() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed.json");
        std::fs::write(sibling(&path, "lock"), "12345 old\n").unwrap();
        let s = JsonFileStore::open_with(&path, Duration::ZERO).await;
        assert!(s.is_ok());
    }

    #[tokio::test]
    async fn corrupt_state_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed.json");
        std::fs::write(&path, "{not json").unwrap();
        let s = JsonFileStore::open(&path).await;
        assert!(matches!(s, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed.json");
        let s = JsonFileStore::open(&path).await.unwrap();
        assert!(s.commit("never-claimed", &ClaimToken("x".into())).await.is_err());
        assert!(!path.exists());
    }
}
