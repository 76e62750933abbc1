//! Structural validation findings for imported OpenAPI and Swagger documents.

use serde::{Deserialize, Serialize};

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks import.
    Error,
    /// Reported but never blocks import.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted locator into the source document (`"paths./foo.get"`), `$` for the root
    pub path: String,
    /// Human-readable description
    pub message: String,
    /// Severity level
    pub severity: Severity,
}

impl ValidationError {
    /// Creates an error-level finding.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Creates a warning-level finding.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Check if this finding blocks import.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// True iff any finding has error severity. Warnings never gate import.
#[must_use]
pub fn has_validation_errors(findings: &[ValidationError]) -> bool {
    findings.iter().any(ValidationError::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_validation_errors() {
        assert!(!has_validation_errors(&[]));
        assert!(!has_validation_errors(&[ValidationError::warning("info.title", "missing")]));
        assert!(has_validation_errors(&[
            ValidationError::warning("info.title", "missing"),
            ValidationError::error("paths", "missing"),
        ]));
    }

    #[test]
    fn test_display() {
        let finding = ValidationError::error("paths.invalid", "must start with /");
        assert_eq!(finding.to_string(), "[error] paths.invalid: must start with /");
    }
}
