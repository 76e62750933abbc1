//! In-memory key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use probe_application::{ApplicationResult, KeyValueStore};
use tokio::sync::RwLock;

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Returns true when nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryKeyValueStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get("probe.history").await.unwrap(), None);

        store.set("probe.history", "[]").await.unwrap();
        store.set("probe.history", "[1]").await.unwrap();

        assert_eq!(store.get("probe.history").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.len().await, 1);
    }
}
