//! File-backed key-value store.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use probe_application::{ApplicationError, ApplicationResult, KeyValueStore};
use tokio::fs;
use tracing::debug;

/// Error type for the file-backed store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be mapped to a file name.
    #[error("Invalid key: '{0}'")]
    InvalidKey(String),

    /// Reading or writing a value file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl From<StoreError> for ApplicationError {
    fn from(error: StoreError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Key-value store that keeps one `<key>.json` file per key under `root`.
///
/// The root directory is created on first write. Writes go to a temporary
/// file that is then renamed over the target, so a crash never leaves a
/// half-written value behind.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    ///
    /// ASCII letters, digits, `.`, `_` and `-` are kept; every other byte is
    /// written as `%XX`, so distinct keys never share a file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for empty keys and keys made only
    /// of dots.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.chars().all(|c| c == '.') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let mut file_name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
                file_name.push(char::from(byte));
            } else {
                let _ = write!(file_name, "%{byte:02X}");
            }
        }
        file_name.push_str(".json");
        Ok(self.root.join(file_name))
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .await
            .map_err(|source| StoreError::Io {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(key, path = %path.display(), "Stored value");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        Ok(self.read(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
        Ok(self.write(key, value).await?)
    }
}
