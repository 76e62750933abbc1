//! Postman Import Module
//!
//! Postman Collection v2.1 types and the importer that maps them onto
//! Probe collections. The exporter reuses the same types.

mod importer;
pub mod types;

pub use importer::import_postman;
pub use types::PostmanCollection;
