//! Key-value persistence port

use async_trait::async_trait;

use crate::ApplicationResult;

/// Port for the local key-value storage that backs history and monitors.
///
/// Values are JSON text. A missing key reads as `None`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> ApplicationResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> ApplicationResult<()>;
}
