//! Deterministic JSON serialization for persisted values and native export.
//!
//! Output uses 2-space indentation and ends with a newline, so files written
//! by the store and by `probe export` diff cleanly.

mod json;

pub use json::{SerializationError, from_json, to_json_stable};
