//! Probe Domain - Core business types
//!
//! This crate defines the domain model for Probe: collections, requests,
//! environments, validation findings, monitors, run results and history.
//! All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod environment;
pub mod error;
pub mod export;
pub mod format;
pub mod history;
pub mod id;
pub mod monitor;
pub mod request;
pub mod response;
pub mod run;
pub mod testing;
pub mod validation;

pub use collection::{Collection, Folder};
pub use environment::{
    Environment, GlobalVars, ResolutionScope, ResolvedVariable, VariableScope, find_active,
};
pub use error::{DomainError, DomainResult};
pub use export::ExportFormat;
pub use format::SpecFormat;
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryEntry, RequestHistory};
pub use id::{generate_id, id_or_generate};
pub use monitor::{
    Monitor, MonitorRunRecord, MonitorSchedule, MonitorThresholds, RequestSummary,
    ThresholdBreach, WebhookPayload, evaluate_thresholds,
};
pub use request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};
pub use response::ApiResponse;
pub use run::{RequestRunResult, RunResult};
pub use testing::{Assertion, AssertionResult, StatusExpectation};
pub use validation::{Severity, ValidationError, has_validation_errors};
