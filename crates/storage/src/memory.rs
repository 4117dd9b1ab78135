use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{KeyValueStore, StorageResult};

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_and_remove_round_through_the_map() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        store.set("greeting", "hello").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello"));

        store.set("greeting", "namaste").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("namaste"));
        assert_eq!(store.len().await, 1);

        store.remove("greeting").await.unwrap();
        store.remove("greeting").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap(), None);
    }
}
