//! Webhook notifier port

use async_trait::async_trait;
use probe_domain::monitor::WebhookPayload;

use crate::ApplicationResult;

/// Port for delivering monitor alerts.
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Posts the payload to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery failed. Retries, if any, happen inside
    /// the implementation.
    async fn notify(&self, url: &str, payload: &WebhookPayload) -> ApplicationResult<()>;
}
