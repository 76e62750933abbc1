//! Port adapters backed by real I/O.

mod reqwest_executor;
mod system_clock;
mod webhook;

#[cfg(test)]
mod test_server;

pub use reqwest_executor::{DEFAULT_TIMEOUT_MS, ReqwestExecutor};
pub use system_clock::SystemClock;
pub use webhook::ReqwestWebhookNotifier;
