//! Export format types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Formats a collection list can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Canonical JSON array of collections.
    #[default]
    Native,
    /// Postman Collection v2.1.
    Postman,
    /// OpenAPI 3.0 as JSON.
    OpenApiJson,
    /// OpenAPI 3.0 as YAML.
    OpenApiYaml,
}

impl ExportFormat {
    /// Get all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Native,
            Self::Postman,
            Self::OpenApiJson,
            Self::OpenApiYaml,
        ]
    }

    /// Identifier used on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Postman => "postman",
            Self::OpenApiJson => "openapi-json",
            Self::OpenApiYaml => "openapi-yaml",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Native => "Probe Collections",
            Self::Postman => "Postman Collection v2.1",
            Self::OpenApiJson => "OpenAPI 3.0 (JSON)",
            Self::OpenApiYaml => "OpenAPI 3.0 (YAML)",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("unknown export format: {s}"))
    }
}
