//! Response type
//!
//! What an injected executor hands back for one request.

use serde::{Deserialize, Serialize};

use crate::request::{KeyValuePair, find_ignore_case};

/// Returns the canonical reason phrase for common status codes.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// HTTP response received for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,
    /// Response headers in received order.
    #[serde(default)]
    pub headers: Vec<KeyValuePair>,
    /// Response body as (lossy) UTF-8 text.
    #[serde(default)]
    pub body: String,
    /// Wall-clock time from send to last body byte.
    pub time_ms: u64,
    /// Response size in bytes.
    pub size: usize,
}

impl ApiResponse {
    /// Creates a response from raw parts.
    #[must_use]
    pub fn new(status: u16, headers: Vec<KeyValuePair>, body: &[u8], time_ms: u64) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers,
            body: String::from_utf8_lossy(body).into_owned(),
            time_ms,
            size: body.len(),
        }
    }

    /// Looks up a header value (case-insensitive name).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_ignore_case(&self.headers, name)
    }
}
