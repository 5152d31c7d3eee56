//! Directory-backed persistence gateway storing one JSON document per qid.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::PersistenceGateway;
use crate::cache::{current_timestamp_ms, QueryPayload};
use crate::error::{CacheError, Result};

/// Writes each payload to `<dir>/<key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a partial document.
#[derive(Debug)]
pub struct JsonFileGateway {
    dir: PathBuf,
    next_key: AtomicU64,
}

impl JsonFileGateway {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            next_key: AtomicU64::new(current_timestamp_ms()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names, so only accept the shape this store mints.
        let well_formed = key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if key.is_empty() || !well_formed {
            return Err(CacheError::InvalidRequest(format!("malformed qid: {}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Claims the next key with no document on disk yet.
    async fn allocate_key(&self) -> Result<(String, PathBuf)> {
        loop {
            let key = self.next_key.fetch_add(1, Ordering::Relaxed).to_string();
            let path = self.path_for(&key)?;
            if !fs::try_exists(&path).await? {
                return Ok((key, path));
            }
        }
    }
}

/// Writes `body` beside `path` and renames it into place. The temporary file
/// never outlives a failed write.
async fn write_document(path: &Path, body: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let written = match fs::write(&tmp, body).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(err) => Err(err),
    };

    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!(
                    error = %cleanup,
                    path = %tmp.display(),
                    "failed to remove temporary qid file"
                );
            }
        }
        return Err(err.into());
    }
    Ok(())
}

#[async_trait]
impl PersistenceGateway for JsonFileGateway {
    async fn put(&self, payload: &QueryPayload) -> Result<String> {
        let (key, path) = self.allocate_key().await?;
        let body = serde_json::to_vec(payload)?;

        write_document(&path, &body).await?;

        debug!(key = %key, bytes = body.len(), "qid written to file store");
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<QueryPayload>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileGateway::open(dir.path()).await.unwrap();

        let payload = QueryPayload {
            fqs: vec!["state:QLD".to_string()],
            ..QueryPayload::new("genus:Eucalyptus")
        };
        let key = gateway.put(&payload).await.unwrap();

        assert!(dir.path().join(format!("{}.json", key)).exists());
        assert_eq!(gateway.get(&key).await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn test_reopened_store_sees_earlier_writes() {
        let dir = tempfile::tempdir().unwrap();
        let key = {
            let gateway = JsonFileGateway::open(dir.path()).await.unwrap();
            gateway.put(&QueryPayload::new("a")).await.unwrap()
        };

        let reopened = JsonFileGateway::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), Some(QueryPayload::new("a")));

        let other = reopened.put(&QueryPayload::new("b")).await.unwrap();
        assert_ne!(other, key);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileGateway::open(dir.path()).await.unwrap();

        assert_eq!(gateway.get("12345").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileGateway::open(dir.path()).await.unwrap();

        assert!(matches!(
            gateway.get("../etc/passwd").await,
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileGateway::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("7.json"), b"not json").unwrap();

        assert!(matches!(
            gateway.get("7").await,
            Err(CacheError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory sits where the document should land.
        let target = dir.path().join("9.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();

        let result = write_document(&target, b"{}").await;

        assert!(matches!(result, Err(CacheError::Persistence(_))));
        assert!(!dir.path().join("9.json.tmp").exists());
        assert!(target.is_dir());
    }
}
