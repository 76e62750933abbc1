//! Monitor scheduler
//!
//! Owns one recurring task per enabled monitor. Each tick spawns a firing
//! that runs the monitor's collection, evaluates thresholds, posts the
//! webhook on a breach and appends a run record.
//!
//! Scheduling spawns tokio tasks, so it must be called from within a runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use probe_domain::monitor::{
    Monitor, MonitorRunRecord, MonitorSchedule, WebhookPayload, evaluate_thresholds,
};
use probe_domain::run::RunResult;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::{ApplicationError, ApplicationResult};
use crate::ports::{Clock, WebhookNotifier, WorkspaceSource};
use crate::runner::CollectionRunner;
use crate::stores::MonitorStore;

/// What happened when a monitor was asked to fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// The firing ran and produced this record.
    Completed(MonitorRunRecord),
    /// A previous firing of the same monitor is still running.
    SkippedBusy,
    /// The monitor is disabled.
    Disabled,
    /// No monitor has this id.
    NotFound,
}

struct ScheduledTask {
    schedule: MonitorSchedule,
    handle: JoinHandle<()>,
}

/// Clears the busy flag when the firing ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct SchedulerInner {
    runner: CollectionRunner,
    workspace: Arc<dyn WorkspaceSource>,
    monitors: Arc<MonitorStore>,
    notifier: Arc<dyn WebhookNotifier>,
    clock: Arc<dyn Clock>,
    tasks: Mutex<HashMap<String, ScheduledTask>>,
    busy: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Schedules monitors and runs their firings.
///
/// Cheap to clone; clones share the same set of tasks.
#[derive(Clone)]
pub struct MonitorScheduler {
    inner: Arc<SchedulerInner>,
}

impl MonitorScheduler {
    /// Creates a scheduler with nothing scheduled.
    #[must_use]
    pub fn new(
        runner: CollectionRunner,
        workspace: Arc<dyn WorkspaceSource>,
        monitors: Arc<MonitorStore>,
        notifier: Arc<dyn WebhookNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                runner,
                workspace,
                monitors,
                notifier,
                clock,
                tasks: Mutex::new(HashMap::new()),
                busy: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The monitor store backing this scheduler.
    #[must_use]
    pub fn store(&self) -> &MonitorStore {
        &self.inner.monitors
    }

    /// Loads every stored monitor and schedules the enabled ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitors cannot be read.
    pub async fn start(&self) -> ApplicationResult<usize> {
        let monitors = self.inner.monitors.list().await?;
        self.sync(&monitors);
        Ok(self.scheduled_ids().len())
    }

    /// Saves a monitor and schedules or cancels it according to `enabled`.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor cannot be stored.
    pub async fn save_monitor(&self, monitor: Monitor) -> ApplicationResult<()> {
        self.inner.monitors.upsert(monitor.clone()).await?;
        self.schedule(&monitor);
        Ok(())
    }

    /// Cancels and deletes a monitor. A firing already in flight completes
    /// but stores no run record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no monitor has this id.
    pub async fn delete_monitor(&self, monitor_id: &str) -> ApplicationResult<Monitor> {
        self.cancel(monitor_id);
        lock(&self.inner.busy).remove(monitor_id);
        self.inner.monitors.remove(monitor_id).await
    }

    /// Makes the scheduled set match `monitors`: enabled ones are scheduled,
    /// everything else is cancelled.
    pub fn sync(&self, monitors: &[Monitor]) {
        for monitor in monitors {
            self.schedule(monitor);
        }
        let stale: Vec<String> = self
            .scheduled_ids()
            .into_iter()
            .filter(|id| !monitors.iter().any(|m| m.enabled && &m.id == id))
            .collect();
        for id in stale {
            self.cancel(&id);
        }
    }

    /// Schedules one monitor. Disabled monitors are cancelled instead.
    ///
    /// The first firing happens one full period after scheduling. Returns
    /// true if the monitor is scheduled afterwards.
    pub fn schedule(&self, monitor: &Monitor) -> bool {
        if !monitor.enabled {
            self.cancel(&monitor.id);
            return false;
        }

        let mut tasks = lock(&self.inner.tasks);
        if let Some(task) = tasks.get(&monitor.id) {
            if task.schedule == monitor.schedule && !task.handle.is_finished() {
                return true;
            }
        }
        if let Some(previous) = tasks.remove(&monitor.id) {
            previous.handle.abort();
        }

        let handle = spawn_ticker(
            Arc::downgrade(&self.inner),
            monitor.id.clone(),
            monitor.schedule,
        );
        tasks.insert(
            monitor.id.clone(),
            ScheduledTask {
                schedule: monitor.schedule,
                handle,
            },
        );
        info!(monitor = %monitor.name, schedule = %monitor.schedule, "Monitor scheduled");
        true
    }

    /// Cancels a monitor's task. A firing already in flight completes, but
    /// no further tick happens. Returns true if a task was cancelled.
    pub fn cancel(&self, monitor_id: &str) -> bool {
        let removed = lock(&self.inner.tasks).remove(monitor_id);
        removed.is_some_and(|task| {
            task.handle.abort();
            info!(monitor = monitor_id, "Monitor cancelled");
            true
        })
    }

    /// Cancels every task.
    pub fn cancel_all(&self) {
        let tasks: Vec<_> = lock(&self.inner.tasks).drain().collect();
        for (id, task) in tasks {
            task.handle.abort();
            debug!(monitor = %id, "Monitor cancelled");
        }
    }

    /// Returns true if the monitor has a live task.
    #[must_use]
    pub fn is_scheduled(&self, monitor_id: &str) -> bool {
        lock(&self.inner.tasks).contains_key(monitor_id)
    }

    /// Returns true while a firing of the monitor is in progress.
    #[must_use]
    pub fn is_running(&self, monitor_id: &str) -> bool {
        lock(&self.inner.busy)
            .get(monitor_id)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Ids of the scheduled monitors, sorted.
    #[must_use]
    pub fn scheduled_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.inner.tasks).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Fires a monitor immediately, outside its schedule.
    ///
    /// The same re-entrancy guard applies as for scheduled ticks.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor or workspace cannot be read.
    pub async fn fire_now(&self, monitor_id: &str) -> ApplicationResult<FireOutcome> {
        self.inner.fire(monitor_id).await
    }
}

fn spawn_ticker(
    scheduler: Weak<SchedulerInner>,
    monitor_id: String,
    schedule: MonitorSchedule,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = schedule.period();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(inner) = scheduler.upgrade() else {
                break;
            };
            let id = monitor_id.clone();
            // Detached so cancelling the ticker never interrupts a firing.
            tokio::spawn(async move {
                if let Err(error) = inner.fire(&id).await {
                    warn!(monitor = %id, %error, "Monitor firing failed");
                }
            });
        }
    })
}

impl SchedulerInner {
    fn busy_flag(&self, monitor_id: &str) -> Arc<AtomicBool> {
        Arc::clone(
            lock(&self.busy)
                .entry(monitor_id.to_string())
                .or_insert_with(|| Arc::new(AtomicBool::new(false))),
        )
    }

    async fn fire(&self, monitor_id: &str) -> ApplicationResult<FireOutcome> {
        let Some(monitor) = self.monitors.get(monitor_id).await? else {
            return Ok(FireOutcome::NotFound);
        };
        if !monitor.enabled {
            return Ok(FireOutcome::Disabled);
        }

        let flag = self.busy_flag(monitor_id);
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(monitor = %monitor.name, "Previous firing still running, skipping");
            return Ok(FireOutcome::SkippedBusy);
        }
        let _busy = BusyGuard(flag);

        let record = self.run_monitor(&monitor).await?;
        Ok(FireOutcome::Completed(record))
    }

    async fn run_monitor(&self, monitor: &Monitor) -> ApplicationResult<MonitorRunRecord> {
        info!(monitor = %monitor.name, "Monitor firing");
        let workspace = self.workspace.snapshot().await?;

        let run = if let Some(collection) = workspace.collection(&monitor.collection_id) {
            self.runner
                .run(
                    collection,
                    monitor.folder_id.as_deref(),
                    monitor.environment_id.as_deref(),
                    &workspace.environments,
                    &workspace.globals,
                )
                .await
        } else {
            warn!(
                monitor = %monitor.name,
                collection = %monitor.collection_id,
                "Monitored collection not found"
            );
            let now = self.clock.now();
            RunResult::from_results(
                monitor.collection_id.clone(),
                monitor.folder_id.clone(),
                now,
                now,
                Vec::new(),
            )
        };

        let breaches = evaluate_thresholds(&monitor.thresholds, &run);
        let record = MonitorRunRecord::from_run(monitor.id.clone(), self.clock.now(), &run, breaches);

        if record.has_breaches() {
            warn!(
                monitor = %monitor.name,
                breaches = record.breaches.len(),
                "Monitor thresholds breached"
            );
            if let Some(url) = monitor.webhook_url() {
                let payload = WebhookPayload::new(monitor, &record);
                if let Err(error) = self.notifier.notify(url, &payload).await {
                    warn!(monitor = %monitor.name, %error, "Webhook delivery failed");
                }
            }
        }

        match self.monitors.mark_run(&monitor.id, record.timestamp).await {
            Err(ApplicationError::NotFound(_)) => {
                debug!(monitor = %monitor.name, "Monitor deleted during firing, record dropped");
                return Ok(record);
            }
            Err(error) => {
                warn!(monitor = %monitor.name, %error, "Failed to update last run time");
            }
            Ok(()) => {}
        }
        if let Err(error) = self.monitors.append_record(&record).await {
            warn!(monitor = %monitor.name, %error, "Failed to store run record");
        }

        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryWorkspace, WorkspaceSnapshot};
    use crate::test_support::{FixedClock, MemoryStore, RecordingNotifier, ScriptedExecutor};
    use pretty_assertions::assert_eq;
    use probe_domain::collection::Collection;
    use probe_domain::monitor::MonitorThresholds;
    use probe_domain::request::ApiRequest;
    use std::time::Duration;

    struct Harness {
        scheduler: MonitorScheduler,
        executor: Arc<ScriptedExecutor>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(executor: ScriptedExecutor, notifier: RecordingNotifier) -> Harness {
        let collection = Collection::new("Health")
            .with_id("col")
            .with_request(ApiRequest::get("status", "https://api.test/status"))
            .with_request(ApiRequest::get("users", "https://api.test/users"));
        let workspace = Arc::new(InMemoryWorkspace::new(WorkspaceSnapshot {
            collections: vec![collection],
            ..WorkspaceSnapshot::default()
        }));
        let executor = Arc::new(executor);
        let notifier = Arc::new(notifier);
        let clock = Arc::new(FixedClock::default());
        let runner = CollectionRunner::new(executor.clone(), clock.clone());
        let monitors = Arc::new(MonitorStore::new(Arc::new(MemoryStore::default())));
        let scheduler =
            MonitorScheduler::new(runner, workspace, monitors, notifier.clone(), clock);
        Harness {
            scheduler,
            executor,
            notifier,
        }
    }

    fn monitor() -> Monitor {
        Monitor::new("Health", "col", MonitorSchedule::FiveMinutes).with_id("m1")
    }

    #[tokio::test]
    async fn test_fire_appends_record_and_marks_run() {
        let h = harness(ScriptedExecutor::ok(200, 30), RecordingNotifier::default());
        h.scheduler.store().upsert(monitor()).await.unwrap();

        let FireOutcome::Completed(record) = h.scheduler.fire_now("m1").await.unwrap() else {
            panic!("expected a completed firing");
        };
        assert!(record.passed);
        assert_eq!(record.total_requests, 2);

        let store = h.scheduler.store();
        assert_eq!(store.records("m1").await.unwrap(), vec![record.clone()]);
        assert_eq!(
            store.get("m1").await.unwrap().unwrap().last_run_at,
            Some(record.timestamp)
        );
        assert!(h.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_monitors_do_not_fire() {
        let h = harness(ScriptedExecutor::ok(200, 30), RecordingNotifier::default());
        assert_eq!(h.scheduler.fire_now("m1").await.unwrap(), FireOutcome::NotFound);

        h.scheduler
            .save_monitor(monitor().with_enabled(false))
            .await
            .unwrap();
        assert!(!h.scheduler.is_scheduled("m1"));
        assert_eq!(h.scheduler.fire_now("m1").await.unwrap(), FireOutcome::Disabled);
        assert!(h.executor.sent_urls().is_empty());
    }

    #[tokio::test]
    async fn test_breach_posts_webhook_once() {
        let h = harness(ScriptedExecutor::ok(503, 30), RecordingNotifier::default());
        let thresholds = MonitorThresholds {
            min_status_code: 400,
            alert_on_test_failure: false,
            max_response_time_ms: 10,
        };
        h.scheduler
            .store()
            .upsert(
                monitor()
                    .with_thresholds(thresholds)
                    .with_webhook("https://hooks.test/alert"),
            )
            .await
            .unwrap();

        let FireOutcome::Completed(record) = h.scheduler.fire_now("m1").await.unwrap() else {
            panic!("expected a completed firing");
        };
        assert_eq!(record.breaches.len(), 3);
        assert!(!record.passed);

        let calls = h.notifier.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://hooks.test/alert");
        assert_eq!(calls[0].1.monitor_id, "m1");
        assert_eq!(calls[0].1.min_status_code, 503);
    }

    #[tokio::test]
    async fn test_webhook_failure_does_not_fail_firing() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let h = harness(ScriptedExecutor::ok(500, 30), notifier);
        let thresholds = MonitorThresholds {
            min_status_code: 500,
            ..MonitorThresholds::default()
        };
        h.scheduler
            .store()
            .upsert(monitor().with_thresholds(thresholds).with_webhook("https://hooks.test"))
            .await
            .unwrap();

        let outcome = h.scheduler.fire_now("m1").await.unwrap();
        assert!(matches!(outcome, FireOutcome::Completed(_)));
        assert_eq!(h.scheduler.store().records("m1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reentrant_firing_is_skipped() {
        let h = harness(ScriptedExecutor::ok(200, 30).gated(), RecordingNotifier::default());
        h.scheduler.store().upsert(monitor()).await.unwrap();

        let first = {
            let scheduler = h.scheduler.clone();
            tokio::spawn(async move { scheduler.fire_now("m1").await })
        };
        while !h.scheduler.is_running("m1") {
            tokio::task::yield_now().await;
        }

        assert_eq!(h.scheduler.fire_now("m1").await.unwrap(), FireOutcome::SkippedBusy);

        h.executor.release(2);
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, FireOutcome::Completed(_)));
        assert!(!h.scheduler.is_running("m1"));

        h.executor.release(2);
        let again = h.scheduler.fire_now("m1").await.unwrap();
        assert!(matches!(again, FireOutcome::Completed(_)));
        assert_eq!(h.scheduler.store().records("m1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_during_firing_drops_record() {
        let h = harness(ScriptedExecutor::ok(200, 30).gated(), RecordingNotifier::default());
        h.scheduler.save_monitor(monitor()).await.unwrap();

        let firing = {
            let scheduler = h.scheduler.clone();
            tokio::spawn(async move { scheduler.fire_now("m1").await })
        };
        while !h.scheduler.is_running("m1") {
            tokio::task::yield_now().await;
        }

        h.scheduler.delete_monitor("m1").await.unwrap();
        assert!(!h.scheduler.is_running("m1"));
        assert!(!h.scheduler.is_scheduled("m1"));

        h.executor.release(2);
        let outcome = firing.await.unwrap().unwrap();
        assert!(matches!(outcome, FireOutcome::Completed(_)));
        assert!(h.scheduler.store().records("m1").await.unwrap().is_empty());
        assert!(h.scheduler.store().get("m1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_one_period_and_stops_on_cancel() {
        let h = harness(ScriptedExecutor::ok(200, 30), RecordingNotifier::default());
        h.scheduler.save_monitor(monitor()).await.unwrap();
        assert!(h.scheduler.is_scheduled("m1"));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(h.scheduler.store().records("m1").await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.scheduler.store().records("m1").await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(h.scheduler.store().records("m1").await.unwrap().len(), 2);

        assert!(h.scheduler.cancel("m1"));
        tokio::time::sleep(Duration::from_secs(3_000)).await;
        assert_eq!(h.scheduler.store().records("m1").await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_cancels_task() {
        let h = harness(ScriptedExecutor::ok(200, 30), RecordingNotifier::default());
        h.scheduler.save_monitor(monitor()).await.unwrap();
        h.scheduler
            .save_monitor(monitor().with_enabled(false))
            .await
            .unwrap();
        assert!(!h.scheduler.is_scheduled("m1"));

        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert!(h.executor.sent_urls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_and_delete() {
        let h = harness(ScriptedExecutor::ok(200, 30), RecordingNotifier::default());
        let a = monitor();
        let b = Monitor::new("Other", "col", MonitorSchedule::Daily).with_id("m2");
        let c = Monitor::new("Off", "col", MonitorSchedule::Daily)
            .with_id("m3")
            .with_enabled(false);
        for m in [&a, &b, &c] {
            h.scheduler.store().upsert(m.clone()).await.unwrap();
        }

        assert_eq!(h.scheduler.start().await.unwrap(), 2);
        assert_eq!(h.scheduler.scheduled_ids(), vec!["m1", "m2"]);

        h.scheduler.sync(std::slice::from_ref(&b));
        assert_eq!(h.scheduler.scheduled_ids(), vec!["m2"]);

        h.scheduler.delete_monitor("m2").await.unwrap();
        assert!(h.scheduler.scheduled_ids().is_empty());
        assert!(h.scheduler.store().get("m2").await.unwrap().is_none());

        h.scheduler.save_monitor(a).await.unwrap();
        h.scheduler.cancel_all();
        assert!(h.scheduler.scheduled_ids().is_empty());
    }
}
