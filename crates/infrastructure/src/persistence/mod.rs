//! Key-value store adapters.
//!
//! [`FileKeyValueStore`] keeps one JSON file per key under the data
//! directory; [`MemoryKeyValueStore`] keeps everything in a map for runs
//! that should leave nothing behind.

mod file_store;
mod memory_store;

pub use file_store::{FileKeyValueStore, StoreError};
pub use memory_store::MemoryKeyValueStore;
