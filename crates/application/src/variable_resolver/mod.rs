//! Variable resolution module
//!
//! Provides parsing and resolution of `{{variable}}` syntax in strings and
//! whole requests.
//!
//! # Usage
//!
//! ```
//! use probe_application::variable_resolver::resolve_request;
//! use probe_domain::environment::Environment;
//! use probe_domain::request::{ApiRequest, KeyValuePair};
//!
//! let globals = vec![KeyValuePair::new("host", "global.com")];
//! let environments = vec![Environment::new("dev").with_id("dev").with_variable("host", "env.com")];
//! let request = ApiRequest::get("Ping", "https://{{host}}/{{missing}}");
//!
//! let resolved = resolve_request(&request, Some("dev"), &environments, &globals);
//! assert_eq!(resolved.url, "https://env.com/{{missing}}");
//! ```

pub mod engine;
pub mod parser;
pub mod request;

pub use engine::{ResolutionResult, VariableResolver};
pub use parser::{VariableReference, parse_variables};
pub use request::{ResolvedRequest, resolve_request, resolve_with};
