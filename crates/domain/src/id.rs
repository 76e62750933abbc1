//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered identifier as a string.
///
/// This is the standard ID format for collections, folders, requests,
/// monitors and run records created by Probe itself. Imported entities keep
/// whatever identifier the source document carried.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns `id` when it is non-blank, otherwise a freshly generated one.
#[must_use]
pub fn id_or_generate(id: Option<&str>) -> String {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_id(),
    }
}
