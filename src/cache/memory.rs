//! In-memory [`KeyValueStore`] for tests and database-less runs.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so entries list in key order.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{EntryInfo, KeyValueStore};

struct StoredValue {
    text: String,
    updated_at: i64,
}

pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory cache lock poisoned")
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).map(|v| v.text.clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(
            key.to_string(),
            StoredValue {
                text: value.to_string(),
                updated_at: chrono::Utc::now().timestamp(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    async fn entries(&self) -> Result<Vec<EntryInfo>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .map(|(key, v)| EntryInfo {
                key: key.clone(),
                updated_at: v.updated_at,
            })
            .collect())
    }
}
