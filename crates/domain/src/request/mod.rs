//! HTTP Request domain types

mod key_value;
mod method;
mod spec;

pub use key_value::{KeyValuePair, enabled, find_ignore_case};
pub use method::HttpMethod;
pub use spec::{ApiRequest, BodyType};
