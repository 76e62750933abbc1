//! Import infrastructure.
//!
//! `text → parse → detect → (validate) → convert`. Detection produces one
//! [`SpecFormat`] tag and conversion dispatches on it to exactly one
//! converter. `OpenAPI` and Swagger documents are gated by the validator:
//! error findings reject the import, warnings travel with the result.

mod detect;
mod error;
mod insomnia;
mod native;
mod openapi;
pub mod postman;
mod validator;

pub use detect::detect_format;
pub use error::ImportError;
pub use insomnia::import_insomnia;
pub use native::import_native;
pub use openapi::import_openapi;
pub use postman::import_postman;
pub use validator::validate_openapi;

use probe_domain::collection::Collection;
use probe_domain::format::SpecFormat;
use probe_domain::validation::{ValidationError, has_validation_errors};
use serde_json::Value;
use tracing::{debug, info};

/// Result of a successful import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Format the document was detected as.
    pub format: SpecFormat,
    /// Converted collections.
    pub collections: Vec<Collection>,
    /// Non-blocking findings from the validator and the converter.
    pub warnings: Vec<ValidationError>,
}

/// Parses document text as JSON, falling back to YAML.
///
/// Text that starts like JSON (`{` or `[`) is only tried as JSON so its
/// syntax errors are reported as such.
///
/// # Errors
///
/// Returns [`ImportError::InvalidJson`] or [`ImportError::InvalidYaml`].
pub fn parse_document(text: &str) -> Result<Value, ImportError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) if looks_like_json(text) => Err(ImportError::InvalidJson(e.to_string())),
        Err(_) => serde_yaml::from_str(text).map_err(|e| ImportError::InvalidYaml(e.to_string())),
    }
}

fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{' | '['))
}

/// Imports collections from raw document text in any supported format.
///
/// # Errors
///
/// Returns an error if the text does not parse, the format is unknown, the
/// validator reports errors, or conversion fails.
pub fn import_collections(text: &str) -> Result<ImportOutcome, ImportError> {
    import_document(&parse_document(text)?)
}

/// Imports collections from an already parsed document.
///
/// # Errors
///
/// See [`import_collections`].
pub fn import_document(document: &Value) -> Result<ImportOutcome, ImportError> {
    let format = detect_format(document);
    debug!(%format, "Detected document format");

    let mut warnings = Vec::new();
    if format.requires_validation() {
        let findings = validate_openapi(document);
        debug!(findings = findings.len(), "Validated API description");
        if has_validation_errors(&findings) {
            return Err(ImportError::Validation(findings));
        }
        warnings = findings;
    }

    let collections = match format {
        SpecFormat::Native => import_native(document)?,
        SpecFormat::Postman => import_postman(document, &mut warnings)?,
        SpecFormat::Insomnia => import_insomnia(document, &mut warnings)?,
        SpecFormat::OpenApi | SpecFormat::Swagger => import_openapi(document, format, &mut warnings)?,
        SpecFormat::Unknown => return Err(ImportError::UnknownFormat),
    };

    info!(
        %format,
        collections = collections.len(),
        warnings = warnings.len(),
        "Import complete"
    );
    Ok(ImportOutcome {
        format,
        collections,
        warnings,
    })
}
