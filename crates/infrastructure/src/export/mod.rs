//! Export infrastructure.
//!
//! [`export_collections`] renders a collection list in one of the
//! [`ExportFormat`]s. Native export is storage and keeps disabled pairs;
//! the wire formats drop them.

mod openapi;
mod postman;

pub use openapi::{OpenApiDocument, OpenApiExporter};
pub use postman::PostmanExporter;

use probe_domain::collection::Collection;
use probe_domain::export::ExportFormat;
use thiserror::Error;
use tracing::debug;

use crate::serialization::to_json_stable;

/// Export error type.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The format cannot represent an empty collection list.
    #[error("Nothing to export: {} needs at least one collection", .0.display_name())]
    Empty(ExportFormat),
}

/// Renders `collections` in `format`.
///
/// Postman documents hold a single collection, so a list exports as a JSON
/// array of Postman documents unless it has exactly one entry. The importer
/// reads both shapes back.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] for a Postman export of no collections and
/// [`ExportError::Serialization`] if the document cannot be written.
pub fn export_collections(
    collections: &[Collection],
    format: ExportFormat,
) -> Result<String, ExportError> {
    debug!(%format, collections = collections.len(), "Exporting collections");
    match format {
        ExportFormat::Native => stable(collections),
        ExportFormat::Postman => match collections {
            [] => Err(ExportError::Empty(format)),
            [only] => stable(&PostmanExporter::export(only)),
            _ => stable(
                &collections
                    .iter()
                    .map(PostmanExporter::export)
                    .collect::<Vec<_>>(),
            ),
        },
        ExportFormat::OpenApiJson => stable(&OpenApiExporter::export(collections)),
        ExportFormat::OpenApiYaml => serde_yaml::to_string(&OpenApiExporter::export(collections))
            .map_err(|e| ExportError::Serialization(e.to_string())),
    }
}

fn stable<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    to_json_stable(value).map_err(|e| ExportError::Serialization(e.to_string()))
}
