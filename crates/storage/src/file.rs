//! JSON-file backed store.
//!
//! The whole map is loaded once on open and rewritten on every mutation.
//! Writes go to a sibling temporary file first and are renamed into place,
//! so a crash mid-write leaves the previous document intact. The in-memory
//! map only takes a mutation once it is on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{KeyValueStore, StorageError, StorageResult};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file yields an empty store; the file is only created on
    /// the first write.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StorageError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let entries: BTreeMap<String, String> = match fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => BTreeMap::new(),
            Ok(json) => serde_json::from_str(&json).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        info!(path = %path.display(), keys = entries.len(), "local storage opened");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(entries)?;

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, json)
            .await
            .map_err(|source| StorageError::Io {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), keys = entries.len(), "local storage flushed");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        let mut staged = entries.clone();
        staged.insert(key.to_owned(), value.to_owned());
        self.flush(&staged).await?;
        *entries = staged;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut staged = entries.clone();
        staged.remove(key);
        self.flush(&staged).await?;
        *entries = staged;
        Ok(())
    }
}
