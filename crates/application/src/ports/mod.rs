//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod key_value_store;
mod request_executor;
mod webhook;
mod workspace;

pub use clock::Clock;
pub use key_value_store::KeyValueStore;
pub use request_executor::{RequestExecutor, TransportError};
pub use webhook::WebhookNotifier;
pub use workspace::{InMemoryWorkspace, WorkspaceSnapshot, WorkspaceSource};
