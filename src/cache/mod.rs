//! Result cache.
//!
//! The [`KeyValueStore`] trait is the raw text store; [`InMemoryStore`]
//! backs tests and `--offline` runs without a database, [`SqliteStore`] is the
//! persistent backend used by the CLI.
//!
//! [`Cache`] sits on top and owns the policy:
//!
//! - logical keys (`org_acme`) are stored as `{prefix}_{key}` (`bml_org_acme`)
//! - values are serialized as JSON text
//! - write failures are logged and swallowed
//! - read failures and undecodable values are logged and read as absent
//!
//! Entries are never expired or evicted; they live until the store is
//! cleared with [`Cache::clear`] or removed externally.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Key and last write time of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: String,
    /// Unix seconds.
    pub updated_at: i64,
}

/// Raw text key/value storage.
///
/// Implementations must be `Send + Sync`; the cache is only ever driven by
/// one search at a time, so no stronger ordering is required.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Returns whether the key existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// All entries, sorted by key.
    async fn entries(&self) -> Result<Vec<EntryInfo>>;
}

/// Namespaced, best-effort JSON cache over a [`KeyValueStore`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl Cache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Cache over a fresh [`InMemoryStore`].
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key)
    }

    fn logical_key<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        storage_key
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
    }

    /// Serialize and store `value` under `key`. Never fails.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.store.put(&self.storage_key(key), &text).await {
            tracing::warn!(key, error = %e, "could not write cache entry");
        }
    }

    /// Read and deserialize `key`. Any failure reads as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = match self.store.get(&self.storage_key(key)).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring undecodable cache entry");
                None
            }
        }
    }

    /// Logical keys of every entry under this cache's prefix.
    ///
    /// A store that cannot be listed reads as empty.
    pub async fn keys(&self) -> Vec<String> {
        match self.entries().await {
            Ok(entries) => entries.into_iter().map(|e| e.key).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list cache entries");
                Vec::new()
            }
        }
    }

    /// Entries under this cache's prefix, with logical keys.
    pub async fn entries(&self) -> Result<Vec<EntryInfo>> {
        let entries = self.store.entries().await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                self.logical_key(&entry.key).map(|key| EntryInfo {
                    key: key.to_string(),
                    updated_at: entry.updated_at,
                })
            })
            .collect())
    }

    /// Remove every entry under this cache's prefix. Returns how many went.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in self.entries().await? {
            if self.store.remove(&self.storage_key(&entry.key)).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
