//! Stores built on the key-value port

mod history;
mod monitor;

pub use history::{HISTORY_KEY, HistoryStore};
pub use monitor::{MONITORS_KEY, MonitorStore, monitor_runs_key};
