//! Native collection import.

use probe_domain::collection::Collection;
use probe_domain::format::SpecFormat;
use serde::Deserialize;
use serde_json::Value;

use super::ImportError;

/// Reads a `Collection[]` document exactly as Probe writes it.
///
/// # Errors
///
/// Returns [`ImportError::InvalidFormat`] if the document does not match the
/// collection schema.
pub fn import_native(document: &Value) -> Result<Vec<Collection>, ImportError> {
    Vec::<Collection>::deserialize(document).map_err(|e| ImportError::InvalidFormat {
        format: SpecFormat::Native.display_name(),
        message: e.to_string(),
    })
}
