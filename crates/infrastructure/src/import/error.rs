//! Import error types

use probe_domain::validation::ValidationError;
use thiserror::Error;

/// Why a document could not be imported.
///
/// Any of these rejects the whole import; no partial collection is returned.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The text looked like JSON but did not parse.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The text parsed neither as JSON nor as YAML.
    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    /// The document matched none of the known formats.
    #[error("Unknown format: expected a Probe, Postman, Insomnia, OpenAPI or Swagger document")]
    UnknownFormat,

    /// The OpenAPI validator reported at least one error-severity finding.
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// The document was recognised but its content could not be converted.
    #[error("Invalid {format} document: {message}")]
    InvalidFormat {
        /// Display name of the detected format.
        format: &'static str,
        /// What was wrong.
        message: String,
    },
}

impl ImportError {
    /// The validator findings carried by a [`ImportError::Validation`].
    #[must_use]
    pub fn findings(&self) -> &[ValidationError] {
        match self {
            Self::Validation(findings) => findings,
            _ => &[],
        }
    }
}

fn summarize(findings: &[ValidationError]) -> String {
    findings
        .iter()
        .filter(|f| f.is_error())
        .map(|f| format!("{}: {}", f.path, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
