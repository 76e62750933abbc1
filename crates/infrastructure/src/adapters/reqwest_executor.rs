//! Request executor backed by reqwest.
//!
//! Implements the `RequestExecutor` port. Timeouts live here: the runner
//! waits for as long as the executor does.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use probe_application::{RequestExecutor, ResolvedRequest, TransportError};
use probe_domain::request::{HttpMethod, KeyValuePair, find_ignore_case};
use probe_domain::response::ApiResponse;
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const MAX_REDIRECTS: usize = 10;

/// HTTP executor wrapping a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestExecutor {
    /// Creates an executor with the given per-request timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(timeout_ms: u64, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client, timeout_ms })
    }

    /// The underlying client, for adapters that share its connection pool.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return TransportError::TooManyRedirects { max: MAX_REDIRECTS };
        }
        if error.is_body() || error.is_builder() {
            return TransportError::InvalidBody(error.to_string());
        }

        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(&self, request: &ResolvedRequest) -> Result<ApiResponse, TransportError> {
        let url = request.full_url();
        let parsed_url =
            Url::parse(&url).map_err(|e| TransportError::InvalidUrl(format!("{e}: {url}")))?;

        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), parsed_url)
            .timeout(Duration::from_millis(self.timeout_ms));

        for header in &request.headers {
            builder = builder.header(&header.key, &header.value);
        }

        if let Some(body) = request.encoded_body() {
            if let Some(content_type) = request.body_type.content_type()
                && find_ignore_case(&request.headers, "content-type").is_none()
            {
                builder = builder.header("Content-Type", content_type);
            }
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers: Vec<KeyValuePair> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                KeyValuePair::new(name.as_str(), value.to_str().unwrap_or("<binary>"))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?;

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(%url, status, time_ms = elapsed, "Received response");

        Ok(ApiResponse::new(status, headers, &body, elapsed))
    }
}
