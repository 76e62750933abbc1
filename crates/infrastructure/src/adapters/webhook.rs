//! Webhook notifier backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use probe_application::{ApplicationError, ApplicationResult, WebhookNotifier};
use probe_domain::monitor::WebhookPayload;
use reqwest::Client;
use tracing::debug;

/// Posts monitor alerts as JSON.
///
/// A non-2xx answer counts as a failed delivery. No retries.
#[derive(Debug, Clone)]
pub struct ReqwestWebhookNotifier {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestWebhookNotifier {
    /// Creates a notifier around a shared client.
    #[must_use]
    pub const fn new(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }
}

#[async_trait]
impl WebhookNotifier for ReqwestWebhookNotifier {
    async fn notify(&self, url: &str, payload: &WebhookPayload) -> ApplicationResult<()> {
        let response = self
            .client
            .post(url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .json(payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ApplicationError::Internal(format!("webhook delivery failed: {e}")))?;

        debug!(url, status = response.status().as_u16(), monitor = %payload.monitor_id, "Webhook delivered");
        Ok(())
    }
}
