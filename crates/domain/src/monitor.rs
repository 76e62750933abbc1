//! Monitors: scheduled collection runs with alert thresholds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::generate_id;
use crate::request::HttpMethod;
use crate::run::RunResult;

/// How often a monitor fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MonitorSchedule {
    /// Every 5 minutes.
    FiveMinutes,
    /// Every 15 minutes.
    FifteenMinutes,
    /// Every hour.
    #[default]
    Hourly,
    /// Every 6 hours.
    SixHours,
    /// Once a day.
    Daily,
}

impl MonitorSchedule {
    /// All schedules, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::FiveMinutes,
            Self::FifteenMinutes,
            Self::Hourly,
            Self::SixHours,
            Self::Daily,
        ]
    }

    /// Interval token as stored (`5m`, `1h`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::Hourly => "1h",
            Self::SixHours => "6h",
            Self::Daily => "1d",
        }
    }

    /// Time between two firings.
    #[must_use]
    pub const fn period(&self) -> Duration {
        const MINUTE: u64 = 60;
        let secs = match self {
            Self::FiveMinutes => 5 * MINUTE,
            Self::FifteenMinutes => 15 * MINUTE,
            Self::Hourly => 60 * MINUTE,
            Self::SixHours => 6 * 60 * MINUTE,
            Self::Daily => 24 * 60 * MINUTE,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for MonitorSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorSchedule {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|schedule| schedule.as_str() == s)
            .ok_or_else(|| DomainError::UnknownSchedule(s.to_string()))
    }
}

impl TryFrom<String> for MonitorSchedule {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonitorSchedule> for String {
    fn from(value: MonitorSchedule) -> Self {
        value.as_str().to_string()
    }
}

/// Alert thresholds evaluated after every firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorThresholds {
    /// Slowest acceptable response; 0 disables the check.
    pub max_response_time_ms: u64,
    /// Status codes at or above this value alert; 0 disables the check.
    pub min_status_code: u16,
    /// Alert when any request fails its assertions or transport.
    pub alert_on_test_failure: bool,
}

/// A threshold that one firing violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ThresholdBreach {
    /// The slowest response exceeded the limit.
    ResponseTime {
        /// Slowest observed response.
        observed_ms: u64,
        /// Configured limit.
        limit_ms: u64,
    },
    /// A response came back with an alerting status code.
    StatusCode {
        /// Offending request.
        request_name: String,
        /// Status received.
        status_code: u16,
        /// Configured threshold.
        min_status_code: u16,
    },
    /// A request failed.
    TestFailure {
        /// Offending request.
        request_name: String,
        /// Failure messages.
        failures: Vec<String>,
    },
}

impl fmt::Display for ThresholdBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseTime {
                observed_ms,
                limit_ms,
            } => write!(f, "max response time {observed_ms}ms exceeds {limit_ms}ms"),
            Self::StatusCode {
                request_name,
                status_code,
                min_status_code,
            } => write!(
                f,
                "'{request_name}' returned {status_code} (alerting from {min_status_code})"
            ),
            Self::TestFailure {
                request_name,
                failures,
            } => write!(f, "'{request_name}' failed: {}", failures.join("; ")),
        }
    }
}

/// Evaluates thresholds against a run.
///
/// Transport failures carry no status code, so only the test-failure rule
/// sees them.
#[must_use]
pub fn evaluate_thresholds(thresholds: &MonitorThresholds, run: &RunResult) -> Vec<ThresholdBreach> {
    let mut breaches = Vec::new();

    if thresholds.max_response_time_ms > 0
        && run.max_response_time_ms > thresholds.max_response_time_ms
    {
        breaches.push(ThresholdBreach::ResponseTime {
            observed_ms: run.max_response_time_ms,
            limit_ms: thresholds.max_response_time_ms,
        });
    }

    if thresholds.min_status_code > 0 {
        breaches.extend(
            run.results
                .iter()
                .filter(|r| r.error.is_none() && r.status_code >= thresholds.min_status_code)
                .map(|r| ThresholdBreach::StatusCode {
                    request_name: r.request_name.clone(),
                    status_code: r.status_code,
                    min_status_code: thresholds.min_status_code,
                }),
        );
    }

    if thresholds.alert_on_test_failure {
        breaches.extend(
            run.results
                .iter()
                .filter(|r| !r.passed)
                .map(|r| ThresholdBreach::TestFailure {
                    request_name: r.request_name.clone(),
                    failures: r.failed_tests.clone(),
                }),
        );
    }

    breaches
}

/// A persisted schedule that re-runs a collection or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Collection to run.
    pub collection_id: String,
    /// Optional folder scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Environment to resolve against.
    #[serde(default)]
    pub environment_id: Option<String>,
    /// Firing interval.
    #[serde(default)]
    pub schedule: MonitorSchedule,
    /// Alert thresholds.
    #[serde(default)]
    pub thresholds: MonitorThresholds,
    /// Webhook URL; empty disables the webhook.
    #[serde(default)]
    pub webhook: String,
    /// Alert e-mail address (stored only).
    #[serde(default)]
    pub email: String,
    /// Only enabled monitors are scheduled.
    #[serde(default)]
    pub enabled: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the latest firing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Creates an enabled monitor for a collection.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        collection_id: impl Into<String>,
        schedule: MonitorSchedule,
    ) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            collection_id: collection_id.into(),
            folder_id: None,
            environment_id: None,
            schedule,
            thresholds: MonitorThresholds::default(),
            webhook: String::new(),
            email: String::new(),
            enabled: true,
            created_at: Utc::now(),
            last_run_at: None,
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Scopes the monitor to a folder.
    #[must_use]
    pub fn with_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Sets the thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: MonitorThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the webhook URL.
    #[must_use]
    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.webhook = webhook.into();
        self
    }

    /// Enables or disables the monitor.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Webhook URL, when one is configured.
    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        let url = self.webhook.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// Per-request line of a run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    /// Request name.
    pub request_name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Status received, 0 on transport failure.
    pub status_code: u16,
    /// Response time.
    pub response_time_ms: u64,
    /// Whether the request passed.
    pub passed: bool,
}

/// Immutable snapshot of one monitor firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRunRecord {
    /// Record id.
    pub id: String,
    /// Monitor that fired.
    pub monitor_id: String,
    /// When the firing completed.
    pub timestamp: DateTime<Utc>,
    /// No failed request and no breach.
    pub passed: bool,
    /// Requests executed.
    pub total_requests: usize,
    /// Requests that passed.
    pub passed_tests: usize,
    /// Requests that failed.
    pub failed_tests: usize,
    /// Fastest response.
    pub min_response_time_ms: u64,
    /// Slowest response.
    pub max_response_time_ms: u64,
    /// Thresholds violated by this firing.
    #[serde(default)]
    pub breaches: Vec<ThresholdBreach>,
    /// Per-request summary.
    #[serde(default)]
    pub results: Vec<RequestSummary>,
}

impl MonitorRunRecord {
    /// Folds a run and its breaches into a record.
    #[must_use]
    pub fn from_run(
        monitor_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        run: &RunResult,
        breaches: Vec<ThresholdBreach>,
    ) -> Self {
        Self {
            id: generate_id(),
            monitor_id: monitor_id.into(),
            timestamp,
            passed: run.all_passed() && breaches.is_empty(),
            total_requests: run.total_requests,
            passed_tests: run.passed_tests,
            failed_tests: run.failed_tests,
            min_response_time_ms: run.min_response_time_ms,
            max_response_time_ms: run.max_response_time_ms,
            breaches,
            results: run
                .results
                .iter()
                .map(|r| RequestSummary {
                    request_name: r.request_name.clone(),
                    method: r.method,
                    status_code: r.status_code,
                    response_time_ms: r.response_time_ms,
                    passed: r.passed,
                })
                .collect(),
        }
    }

    /// Returns true if any threshold was breached.
    #[must_use]
    pub fn has_breaches(&self) -> bool {
        !self.breaches.is_empty()
    }
}

/// JSON body posted to a monitor's webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Monitor id.
    pub monitor_id: String,
    /// Monitor name.
    pub monitor_name: String,
    /// Whether the firing passed.
    pub passed: bool,
    /// Requests executed.
    pub total_requests: usize,
    /// Requests that passed.
    pub passed_tests: usize,
    /// Requests that failed.
    pub failed_tests: usize,
    /// Slowest response.
    pub max_response_time_ms: u64,
    /// Lowest status code received, 0 when nothing responded.
    pub min_status_code: u16,
    /// When the firing completed.
    pub timestamp: DateTime<Utc>,
    /// Human-readable breach descriptions.
    #[serde(default)]
    pub breaches: Vec<String>,
}

impl WebhookPayload {
    /// Builds the payload for a record.
    #[must_use]
    pub fn new(monitor: &Monitor, record: &MonitorRunRecord) -> Self {
        let min_status_code = record
            .results
            .iter()
            .map(|r| r.status_code)
            .filter(|code| *code > 0)
            .min()
            .unwrap_or(0);
        Self {
            monitor_id: monitor.id.clone(),
            monitor_name: monitor.name.clone(),
            passed: record.passed,
            total_requests: record.total_requests,
            passed_tests: record.passed_tests,
            failed_tests: record.failed_tests,
            max_response_time_ms: record.max_response_time_ms,
            min_status_code,
            timestamp: record.timestamp,
            breaches: record.breaches.iter().map(ToString::to_string).collect(),
        }
    }
}
