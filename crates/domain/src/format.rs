//! Interchange format tags.

use serde::{Deserialize, Serialize};

/// The schema family a parsed document belongs to.
///
/// Produced once by format detection and used to pick exactly one converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    /// Probe's own `Collection[]` JSON
    Native,
    /// Postman Collection v2.1
    Postman,
    /// Insomnia export (flat `resources` list)
    Insomnia,
    /// `OpenAPI` 3.x
    OpenApi,
    /// Swagger 2.0
    Swagger,
    /// Not recognised; import must be rejected
    Unknown,
}

impl SpecFormat {
    /// Get the display name for this format.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Native => "Probe collections",
            Self::Postman => "Postman Collection v2.1",
            Self::Insomnia => "Insomnia export",
            Self::OpenApi => "OpenAPI 3",
            Self::Swagger => "Swagger 2.0",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns true for documents that must pass the OpenAPI validator first.
    #[must_use]
    pub const fn requires_validation(&self) -> bool {
        matches!(self, Self::OpenApi | Self::Swagger)
    }
}

impl std::fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
