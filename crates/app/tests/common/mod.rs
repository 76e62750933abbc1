//! Port fakes shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use probe_application::{
    ApplicationResult, RequestExecutor, ResolvedRequest, TransportError, WebhookNotifier,
};
use probe_domain::monitor::WebhookPayload;
use probe_domain::request::KeyValuePair;
use probe_domain::response::ApiResponse;

/// Answers 200 unless a URL is scripted, and remembers what was sent.
#[derive(Default)]
pub struct FakeExecutor {
    responses: HashMap<String, (u16, u64)>,
    failures: HashMap<String, TransportError>,
    sent: Mutex<Vec<ResolvedRequest>>,
}

impl FakeExecutor {
    pub fn respond(mut self, url: &str, status: u16, time_ms: u64) -> Self {
        self.responses.insert(url.to_string(), (status, time_ms));
        self
    }

    pub fn fail(mut self, url: &str, error: TransportError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    pub fn sent(&self) -> Vec<ResolvedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestExecutor for FakeExecutor {
    async fn execute(&self, request: &ResolvedRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        let url = request.full_url();
        if let Some(error) = self.failures.get(&url) {
            return Err(error.clone());
        }
        let (status, time_ms) = self.responses.get(&url).copied().unwrap_or((200, 10));
        Ok(ApiResponse::new(
            status,
            vec![KeyValuePair::new("Content-Type", "application/json")],
            br#"{"ok":true}"#,
            time_ms,
        ))
    }
}

/// Records every webhook call.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(String, WebhookPayload)>>,
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
        Ok(())
    }
}
