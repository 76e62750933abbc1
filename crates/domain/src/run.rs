//! Collection run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::HttpMethod;
use crate::testing::AssertionResult;

/// Outcome of executing one request during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRunResult {
    /// Id of the executed request.
    pub request_id: String,
    /// Request name.
    pub request_name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Resolved URL that was sent.
    pub url: String,
    /// Response status, 0 when the transport failed.
    pub status_code: u16,
    /// Response time, 0 when the transport failed.
    pub response_time_ms: u64,
    /// True when the transport succeeded and every assertion passed.
    pub passed: bool,
    /// Messages of the assertions that failed.
    #[serde(default)]
    pub failed_tests: Vec<String>,
    /// Transport failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every assertion result, in declaration order.
    #[serde(default)]
    pub assertions: Vec<AssertionResult>,
}

impl RequestRunResult {
    /// Builds a result from a received response's assertion outcomes.
    #[must_use]
    pub fn completed(
        request_id: impl Into<String>,
        request_name: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
        status_code: u16,
        response_time_ms: u64,
        assertions: Vec<AssertionResult>,
    ) -> Self {
        let failed_tests: Vec<String> = assertions
            .iter()
            .filter(|a| !a.passed)
            .map(AssertionResult::failure_text)
            .collect();
        Self {
            request_id: request_id.into(),
            request_name: request_name.into(),
            method,
            url: url.into(),
            status_code,
            response_time_ms,
            passed: failed_tests.is_empty(),
            failed_tests,
            error: None,
            assertions,
        }
    }

    /// Builds a failed result for a request whose transport failed.
    #[must_use]
    pub fn transport_failure(
        request_id: impl Into<String>,
        request_name: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            request_id: request_id.into(),
            request_name: request_name.into(),
            method,
            url: url.into(),
            status_code: 0,
            response_time_ms: 0,
            passed: false,
            failed_tests: vec![error.clone()],
            error: Some(error),
            assertions: Vec::new(),
        }
    }
}

/// Aggregate outcome of one collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Collection that was run.
    pub collection_id: String,
    /// Folder scope, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Number of requests executed.
    pub total_requests: usize,
    /// Number of requests that passed.
    pub passed_tests: usize,
    /// Number of requests that failed.
    pub failed_tests: usize,
    /// Fastest response.
    pub min_response_time_ms: u64,
    /// Slowest response.
    pub max_response_time_ms: u64,
    /// Mean response time.
    pub avg_response_time_ms: u64,
    /// Sum of response times.
    pub total_time_ms: u64,
    /// Per-request outcomes in execution order.
    pub results: Vec<RequestRunResult>,
}

impl RunResult {
    /// Aggregates per-request outcomes.
    ///
    /// Timing statistics only consider requests that received a response;
    /// they are all zero when none did.
    #[must_use]
    pub fn from_results(
        collection_id: impl Into<String>,
        folder_id: Option<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: Vec<RequestRunResult>,
    ) -> Self {
        let passed_tests = results.iter().filter(|r| r.passed).count();
        let timings: Vec<u64> = results
            .iter()
            .filter(|r| r.error.is_none())
            .map(|r| r.response_time_ms)
            .collect();
        let total_time_ms: u64 = timings.iter().sum();
        let avg_response_time_ms = if timings.is_empty() {
            0
        } else {
            total_time_ms / timings.len() as u64
        };

        Self {
            collection_id: collection_id.into(),
            folder_id,
            started_at,
            finished_at,
            total_requests: results.len(),
            passed_tests,
            failed_tests: results.len() - passed_tests,
            min_response_time_ms: timings.iter().copied().min().unwrap_or(0),
            max_response_time_ms: timings.iter().copied().max().unwrap_or(0),
            avg_response_time_ms,
            total_time_ms,
            results,
        }
    }

    /// Returns true if every request passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed_tests == 0
    }
}
