//! Monitor store
//!
//! Monitor definitions live under one key; each monitor's run records live
//! under their own key and are only ever appended to.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use probe_domain::monitor::{Monitor, MonitorRunRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::ports::KeyValueStore;
use crate::{ApplicationError, ApplicationResult};

/// Storage key for monitor definitions.
pub const MONITORS_KEY: &str = "probe.monitors";

/// Storage key for one monitor's run records.
#[must_use]
pub fn monitor_runs_key(monitor_id: &str) -> String {
    format!("probe.monitor_runs.{monitor_id}")
}

/// Persists monitors and their run records through a [`KeyValueStore`].
pub struct MonitorStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl MonitorStore {
    /// Creates a new store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Lists every monitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored monitors cannot be read.
    pub async fn list(&self) -> ApplicationResult<Vec<Monitor>> {
        self.read_list(MONITORS_KEY).await
    }

    /// Finds a monitor by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored monitors cannot be read.
    pub async fn get(&self, monitor_id: &str) -> ApplicationResult<Option<Monitor>> {
        Ok(self.list().await?.into_iter().find(|m| m.id == monitor_id))
    }

    /// Inserts a monitor or replaces the one with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn upsert(&self, monitor: Monitor) -> ApplicationResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut monitors = self.list().await?;
        match monitors.iter_mut().find(|m| m.id == monitor.id) {
            Some(existing) => *existing = monitor,
            None => monitors.push(monitor),
        }
        self.write(MONITORS_KEY, &monitors).await
    }

    /// Removes a monitor. Its run records are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no monitor has this id.
    pub async fn remove(&self, monitor_id: &str) -> ApplicationResult<Monitor> {
        let _guard = self.write_lock.lock().await;
        let mut monitors = self.list().await?;
        let index = monitors
            .iter()
            .position(|m| m.id == monitor_id)
            .ok_or_else(|| ApplicationError::NotFound(format!("monitor {monitor_id}")))?;
        let removed = monitors.remove(index);
        self.write(MONITORS_KEY, &monitors).await?;
        Ok(removed)
    }

    /// Sets `lastRunAt` on a monitor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no monitor has this id, or an error if the
    /// store cannot be read or written.
    pub async fn mark_run(&self, monitor_id: &str, at: DateTime<Utc>) -> ApplicationResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut monitors = self.list().await?;
        let monitor = monitors
            .iter_mut()
            .find(|m| m.id == monitor_id)
            .ok_or_else(|| ApplicationError::NotFound(format!("monitor {monitor_id}")))?;
        monitor.last_run_at = Some(at);
        self.write(MONITORS_KEY, &monitors).await
    }

    /// Run records of one monitor, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored records cannot be read.
    pub async fn records(&self, monitor_id: &str) -> ApplicationResult<Vec<MonitorRunRecord>> {
        self.read_list(&monitor_runs_key(monitor_id)).await
    }

    /// Appends a run record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn append_record(&self, record: &MonitorRunRecord) -> ApplicationResult<()> {
        let _guard = self.write_lock.lock().await;
        let key = monitor_runs_key(&record.monitor_id);
        let mut records: Vec<MonitorRunRecord> = self.read_list(&key).await?;
        records.push(record.clone());
        self.write(&key, &records).await
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> ApplicationResult<Vec<T>> {
        match self.store.get(key).await? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, values: &[T]) -> ApplicationResult<()> {
        let text = serde_json::to_string_pretty(values)?;
        self.store.set(key, &text).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use pretty_assertions::assert_eq;
    use probe_domain::monitor::MonitorSchedule;
    use probe_domain::run::RunResult;

    fn store() -> MonitorStore {
        MonitorStore::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let monitors = store();
        let monitor = Monitor::new("Health", "col", MonitorSchedule::Hourly).with_id("m1");
        monitors.upsert(monitor.clone()).await.unwrap();
        monitors
            .upsert(monitor.clone().with_enabled(false))
            .await
            .unwrap();

        let listed = monitors.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].enabled);

        monitors.remove("m1").await.unwrap();
        assert!(monitors.get("m1").await.unwrap().is_none());
        assert!(matches!(
            monitors.remove("m1").await,
            Err(ApplicationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_records_are_appended_per_monitor() {
        let monitors = store();
        let now = Utc::now();
        let run = RunResult::from_results("col", None, now, now, Vec::new());
        for _ in 0..3 {
            let record = MonitorRunRecord::from_run("m1", now, &run, Vec::new());
            monitors.append_record(&record).await.unwrap();
        }
        let other = MonitorRunRecord::from_run("m2", now, &run, Vec::new());
        monitors.append_record(&other).await.unwrap();

        assert_eq!(monitors.records("m1").await.unwrap().len(), 3);
        assert_eq!(monitors.records("m2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_run() {
        let monitors = store();
        let monitor = Monitor::new("Health", "col", MonitorSchedule::Hourly).with_id("m1");
        monitors.upsert(monitor).await.unwrap();
        let at = Utc::now();
        monitors.mark_run("m1", at).await.unwrap();
        assert_eq!(monitors.get("m1").await.unwrap().unwrap().last_run_at, Some(at));
        assert!(matches!(
            monitors.mark_run("gone", at).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}
