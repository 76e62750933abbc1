//! History store
//!
//! Keeps the newest-first request history under a single key.

use std::sync::Arc;

use probe_domain::history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, RequestHistory};
use tokio::sync::Mutex;
use tracing::debug;

use crate::ApplicationResult;
use crate::ports::KeyValueStore;

/// Storage key for the request history.
pub const HISTORY_KEY: &str = "probe.history";

/// Persists [`HistoryEntry`] values through a [`KeyValueStore`].
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Creates a store with the default retention of 50 entries.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a store with a custom retention cap.
    #[must_use]
    pub fn with_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit,
            write_lock: Mutex::new(()),
        }
    }

    /// Retention cap.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Prepends an entry, dropping the oldest ones past the cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history cannot be read or written.
    pub async fn save(&self, entry: HistoryEntry) -> ApplicationResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut history = RequestHistory::from_entries(self.load().await?, self.limit);
        history.add(entry);
        debug!(entries = history.len(), "Saving request history");
        self.write(&history.into_entries()).await
    }

    /// Returns all entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history cannot be read.
    pub async fn list(&self) -> ApplicationResult<Vec<HistoryEntry>> {
        Ok(RequestHistory::from_entries(self.load().await?, self.limit).into_entries())
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear(&self) -> ApplicationResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(&[]).await
    }

    async fn load(&self) -> ApplicationResult<Vec<HistoryEntry>> {
        match self.store.get(HISTORY_KEY).await? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, entries: &[HistoryEntry]) -> ApplicationResult<()> {
        let text = serde_json::to_string_pretty(entries)?;
        self.store.set(HISTORY_KEY, &text).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use probe_domain::request::ApiRequest;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry::new(
            ApiRequest::get(format!("req {n}"), "https://api.test"),
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_retention_keeps_newest_first() {
        let history = HistoryStore::new(Arc::new(MemoryStore::default()));
        for n in 0..55 {
            history.save(entry(n)).await.unwrap();
        }

        let entries = history.list().await.unwrap();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].request.name, "req 54");
        assert_eq!(entries[49].request.name, "req 5");
    }

    #[tokio::test]
    async fn test_clear() {
        let history = HistoryStore::with_limit(Arc::new(MemoryStore::default()), 3);
        history.save(entry(1)).await.unwrap();
        history.clear().await.unwrap();
        assert!(history.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_an_error() {
        let store = Arc::new(MemoryStore::default());
        store.set(HISTORY_KEY, "not json").await.unwrap();
        let history = HistoryStore::new(store);
        assert!(history.list().await.is_err());
    }
}
