//! Probe Infrastructure - Adapters and implementations
//!
//! This crate provides the format detector, the `OpenAPI`/Swagger validator,
//! the import and export converters, and concrete implementations of the
//! ports defined in the application layer.

pub mod adapters;
pub mod export;
pub mod import;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_TIMEOUT_MS, ReqwestExecutor, ReqwestWebhookNotifier, SystemClock};
pub use export::{ExportError, OpenApiExporter, PostmanExporter, export_collections};
pub use import::{
    ImportError, ImportOutcome, detect_format, import_collections, import_document,
    parse_document, validate_openapi,
};
pub use persistence::{FileKeyValueStore, MemoryKeyValueStore, StoreError};
pub use serialization::{SerializationError, from_json, to_json_stable};
