//! In-memory port fakes shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use probe_domain::monitor::WebhookPayload;
use probe_domain::request::KeyValuePair;
use probe_domain::response::ApiResponse;
use tokio::sync::Semaphore;

use crate::ApplicationResult;
use crate::ports::{Clock, KeyValueStore, RequestExecutor, TransportError, WebhookNotifier};
use crate::variable_resolver::ResolvedRequest;

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Answers every request with the same response unless a URL is scripted.
pub struct ScriptedExecutor {
    status: u16,
    time_ms: u64,
    statuses: HashMap<String, u16>,
    failures: HashMap<String, TransportError>,
    gate: Option<Semaphore>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn ok(status: u16, time_ms: u64) -> Self {
        Self {
            status,
            time_ms,
            statuses: HashMap::new(),
            failures: HashMap::new(),
            gate: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_url(mut self, url: &str, error: TransportError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    pub fn status_for(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    /// Every request waits for a permit from [`Self::release`].
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: &ResolvedRequest) -> Result<ApiResponse, TransportError> {
        let url = request.full_url();
        self.sent.lock().unwrap().push(url.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(error) = self.failures.get(&url) {
            return Err(error.clone());
        }
        let status = self.statuses.get(&url).copied().unwrap_or(self.status);
        Ok(ApiResponse::new(
            status,
            vec![KeyValuePair::new("Content-Type", "application/json")],
            b"{}",
            self.time_ms,
        ))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(String, WebhookPayload)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<(String, WebhookPayload)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookNotifier for RecordingNotifier {
    async fn notify(&self, url: &str, payload: &WebhookPayload) -> ApplicationResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        if self.fail {
            return Err(crate::ApplicationError::Internal("webhook down".into()));
        }
        Ok(())
    }
}
