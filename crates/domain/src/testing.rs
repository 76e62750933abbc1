//! Response assertions.
//!
//! Assertions are attached to a request and evaluated against the response
//! the executor returns. Evaluation is pure: it only reads the response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::ApiResponse;

const PREVIEW_LEN: usize = 100;

/// A test assertion to run against a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Assertion {
    /// Check response status code.
    StatusCode {
        /// Expected status code or range.
        expected: StatusExpectation,
    },
    /// Check response time.
    ResponseTime {
        /// Maximum allowed time in milliseconds.
        max_ms: u64,
    },
    /// Check header exists and optionally its value.
    HeaderExists {
        /// Header name (case-insensitive).
        name: String,
        /// Optional expected value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Check body contains text.
    BodyContains {
        /// Text to search for.
        text: String,
        /// Case-insensitive search.
        #[serde(default)]
        ignore_case: bool,
    },
    /// Check JSON path exists and optionally its value.
    JsonPath {
        /// Path expression (e.g., "$.data.items[0].id").
        path: String,
        /// Expected value (as JSON).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<Value>,
    },
    /// Check body is valid JSON.
    IsJson,
}

impl Assertion {
    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode { expected } => format!("Status code {}", expected.description()),
            Self::ResponseTime { max_ms } => format!("Response time <= {max_ms}ms"),
            Self::HeaderExists {
                name,
                value: Some(v),
            } => format!("Header '{name}' equals '{v}'"),
            Self::HeaderExists { name, value: None } => format!("Header '{name}' exists"),
            Self::BodyContains { text, .. } => format!("Body contains '{text}'"),
            Self::JsonPath {
                path,
                expected: Some(v),
            } => format!("JSON {path} equals {v}"),
            Self::JsonPath {
                path,
                expected: None,
            } => format!("JSON {path} exists"),
            Self::IsJson => "Body is valid JSON".to_string(),
        }
    }

    /// Evaluates this assertion against a response.
    #[must_use]
    pub fn evaluate(&self, response: &ApiResponse) -> AssertionResult {
        let description = self.description();
        match self {
            Self::StatusCode { expected } => {
                let actual = response.status.to_string();
                if expected.matches(response.status) {
                    AssertionResult::pass(description, Some(actual))
                } else {
                    let message = format!(
                        "Expected status {}, got {}",
                        expected.description(),
                        response.status
                    );
                    AssertionResult::fail(description, Some(actual), message)
                }
            }
            Self::ResponseTime { max_ms } => {
                let actual = format!("{}ms", response.time_ms);
                if response.time_ms <= *max_ms {
                    AssertionResult::pass(description, Some(actual))
                } else {
                    let message = format!(
                        "Response took {}ms, expected <= {max_ms}ms",
                        response.time_ms
                    );
                    AssertionResult::fail(description, Some(actual), message)
                }
            }
            Self::HeaderExists { name, value } => match (response.header(name), value) {
                (None, _) => {
                    AssertionResult::fail(description, None, format!("Header '{name}' not found"))
                }
                (Some(actual), Some(expected)) if actual != expected => AssertionResult::fail(
                    description,
                    Some(actual.to_string()),
                    format!("Header '{name}' value mismatch: expected '{expected}', got '{actual}'"),
                ),
                (Some(actual), _) => AssertionResult::pass(description, Some(actual.to_string())),
            },
            Self::BodyContains { text, ignore_case } => {
                let contains = if *ignore_case {
                    response.body.to_lowercase().contains(&text.to_lowercase())
                } else {
                    response.body.contains(text.as_str())
                };
                if contains {
                    AssertionResult::pass(description, None)
                } else {
                    AssertionResult::fail(
                        description,
                        Some(preview(&response.body)),
                        format!("Body does not contain '{text}'"),
                    )
                }
            }
            Self::JsonPath { path, expected } => {
                evaluate_json_path(description, &response.body, path, expected.as_ref())
            }
            Self::IsJson => match serde_json::from_str::<Value>(&response.body) {
                Ok(_) => AssertionResult::pass(description, None),
                Err(e) => {
                    AssertionResult::fail(description, None, format!("Body is not valid JSON: {e}"))
                }
            },
        }
    }
}

fn evaluate_json_path(
    description: String,
    body: &str,
    path: &str,
    expected: Option<&Value>,
) -> AssertionResult {
    let json = match serde_json::from_str::<Value>(body) {
        Ok(json) => json,
        Err(e) => {
            return AssertionResult::fail(
                description,
                None,
                format!("Failed to parse body as JSON: {e}"),
            );
        }
    };

    match query_json_path(&json, path) {
        Ok(Some(value)) => match expected {
            Some(expected) if value != expected => AssertionResult::fail(
                description,
                Some(value.to_string()),
                format!("JSON path '{path}' value mismatch: expected {expected}, got {value}"),
            ),
            _ => AssertionResult::pass(description, Some(value.to_string())),
        },
        Ok(None) => {
            AssertionResult::fail(description, None, format!("JSON path '{path}' not found"))
        }
        Err(e) => {
            AssertionResult::fail(description, None, format!("Invalid JSON path '{path}': {e}"))
        }
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > PREVIEW_LEN {
        let head: String = body.chars().take(PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

/// Queries a JSON value with a small path syntax: `$`, `$.a.b`, `$.items[0].id`.
///
/// # Errors
///
/// Returns a message when the path does not start with `$` or an index is not a number.
pub fn query_json_path<'a>(json: &'a Value, path: &str) -> Result<Option<&'a Value>, String> {
    let Some(rest) = path.trim().strip_prefix('$') else {
        return Err("JSON path must start with '$'".to_string());
    };

    let mut current = json;
    for segment in rest.split('.').filter(|s| !s.is_empty()) {
        let (name, indexes) = match segment.find('[') {
            Some(start) => (&segment[..start], &segment[start..]),
            None => (segment, ""),
        };

        if !name.is_empty() {
            match current.get(name) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        for index in indexes
            .split(']')
            .filter_map(|part| part.strip_prefix('['))
        {
            let idx: usize = index
                .parse()
                .map_err(|_| format!("Invalid array index: {index}"))?;
            match current.get(idx) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
    }

    Ok(Some(current))
}

/// Expected status code value or range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exact status code.
    Exact(u16),
    /// Range of status codes (e.g., 200-299).
    Range {
        /// Minimum status code (inclusive).
        min: u16,
        /// Maximum status code (inclusive).
        max: u16,
    },
    /// One of multiple status codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Check if a status code matches this expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(expected) => status == *expected,
            Self::Range { min, max } => (*min..=*max).contains(&status),
            Self::OneOf(codes) => codes.contains(&status),
        }
    }

    /// Get description of the expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Exact(code) => format!("= {code}"),
            Self::Range { min, max } => format!("in {min}-{max}"),
            Self::OneOf(codes) => {
                let codes: Vec<_> = codes.iter().map(ToString::to_string).collect();
                format!("in [{}]", codes.join(", "))
            }
        }
    }

    /// Create a "success" expectation (200-299).
    #[must_use]
    pub const fn success() -> Self {
        Self::Range { min: 200, max: 299 }
    }
}

impl Default for StatusExpectation {
    fn default() -> Self {
        Self::success()
    }
}

/// Result of running a single assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    /// What the assertion checked.
    pub description: String,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Actual value found (for display).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AssertionResult {
    /// Create a passed result.
    #[must_use]
    pub const fn pass(description: String, actual_value: Option<String>) -> Self {
        Self {
            description,
            passed: true,
            actual_value,
            message: None,
        }
    }

    /// Create a failed result.
    #[must_use]
    pub fn fail(
        description: String,
        actual_value: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            description,
            passed: false,
            actual_value,
            message: Some(message.into()),
        }
    }

    /// Text reported for a failed assertion.
    #[must_use]
    pub fn failure_text(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.description.clone())
    }
}

/// Evaluates every assertion in order.
#[must_use]
pub fn evaluate_all(assertions: &[Assertion], response: &ApiResponse) -> Vec<AssertionResult> {
    assertions.iter().map(|a| a.evaluate(response)).collect()
}
