//! Request executor port
//!
//! The core never talks HTTP itself; a run hands every resolved request to
//! an implementation of [`RequestExecutor`].

use async_trait::async_trait;
use probe_domain::response::ApiResponse;
use thiserror::Error;

use crate::variable_resolver::ResolvedRequest;

/// Why a single request did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was applied.
        timeout_ms: u64,
    },

    /// Host name resolution failed.
    #[error("Could not resolve host '{host}': {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The remote end refused the connection.
    #[error("Connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Connecting failed for another reason.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was hit.
    #[error("Too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The request body could not be sent.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for performing one HTTP request.
///
/// Implementations own timeouts; the runner waits for as long as the
/// executor does.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Sends the request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was received.
    async fn execute(&self, request: &ResolvedRequest) -> Result<ApiResponse, TransportError>;
}
