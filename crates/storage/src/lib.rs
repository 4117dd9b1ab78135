//! Genie Storage Crate
//!
//! A small string key-value store standing in for browser local storage.
//! Values are opaque strings; callers serialise their own records.
//!
//! - [`MemoryStore`] keeps everything in process memory.
//! - [`FileStore`] mirrors the map into a JSON file so state survives restarts.

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// String key-value storage with local-storage semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value for a key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace the value for a key.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
