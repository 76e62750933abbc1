//! Probe Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - Variable resolution over globals and the active environment
//! - The collection runner and the monitor scheduler
//! - History and monitor stores over the key-value port

pub mod error;
pub mod ports;
pub mod runner;
pub mod scheduler;
pub mod stores;
pub mod variable_resolver;

#[cfg(test)]
mod test_support;

pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    Clock, InMemoryWorkspace, KeyValueStore, RequestExecutor, TransportError, WebhookNotifier,
    WorkspaceSnapshot, WorkspaceSource,
};
pub use runner::CollectionRunner;
pub use scheduler::{FireOutcome, MonitorScheduler};
pub use stores::{HISTORY_KEY, HistoryStore, MONITORS_KEY, MonitorStore, monitor_runs_key};
pub use variable_resolver::{ResolvedRequest, VariableResolver, resolve_request};
