//! HTTP Response domain types

mod spec;

pub use spec::{ApiResponse, reason_phrase};
