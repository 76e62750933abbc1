//! Layered configuration.
//!
//! Built-in defaults, then `probe.toml`/`probe.yaml` from the working
//! directory (or the file passed with `--config`), then `PROBE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use probe_domain::history::DEFAULT_HISTORY_LIMIT;
use probe_infrastructure::DEFAULT_TIMEOUT_MS;
use serde::Deserialize;

/// Runtime settings for the `probe` binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Root directory of the file-backed key-value store.
    pub data_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Per-request timeout applied by the HTTP executor.
    pub request_timeout_ms: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Number of history entries kept.
    pub history_limit: usize,
}

impl AppConfig {
    /// Loads the configuration layers.
    ///
    /// An explicit `path` must exist; the implicit `probe.*` file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("data_dir", ".probe")?
            .set_default("log_level", "info")?
            .set_default("request_timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("user_agent", default_user_agent())?
            .set_default("history_limit", u64::try_from(DEFAULT_HISTORY_LIMIT).unwrap_or(50))?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("probe").required(false)),
        };

        builder
            .add_source(Environment::with_prefix("PROBE").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

fn default_user_agent() -> String {
    format!("probe/{}", env!("CARGO_PKG_VERSION"))
}
