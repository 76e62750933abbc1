//! Request specification type

use serde::{Deserialize, Serialize};

use super::{HttpMethod, KeyValuePair, enabled};
use crate::id::generate_id;
use crate::testing::Assertion;

/// How the request body is interpreted and sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// No body
    #[default]
    None,
    /// JSON document in `body`
    Json,
    /// Plain text in `body`
    Text,
    /// XML document in `body`
    Xml,
    /// URL-encoded form built from `formData`
    Form,
}

impl BodyType {
    /// Returns true when the body is free text that may carry `{{tokens}}`.
    #[must_use]
    pub const fn is_text_like(self) -> bool {
        matches!(self, Self::Json | Self::Text | Self::Xml)
    }

    /// Returns the `Content-Type` value implied by this body type.
    #[must_use]
    pub const fn content_type(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Json => Some("application/json"),
            Self::Text => Some("text/plain"),
            Self::Xml => Some("application/xml"),
            Self::Form => Some("application/x-www-form-urlencoded"),
        }
    }

    /// Picks a body type from a declared media type.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("json") {
            Self::Json
        } else if media_type.contains("x-www-form-urlencoded") || media_type.contains("form-data")
        {
            Self::Form
        } else if media_type.contains("xml") {
            Self::Xml
        } else if media_type.is_empty() {
            Self::None
        } else {
            Self::Text
        }
    }
}

/// A saved HTTP request.
///
/// `url`, param/header values and `body` may contain `{{name}}` tokens that
/// are resolved against the active environment and globals at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Target URL (may contain tokens)
    #[serde(default)]
    pub url: String,
    /// Query parameters
    #[serde(default)]
    pub params: Vec<KeyValuePair>,
    /// Request headers
    #[serde(default)]
    pub headers: Vec<KeyValuePair>,
    /// Raw body text
    #[serde(default)]
    pub body: String,
    /// Body interpretation
    #[serde(default)]
    pub body_type: BodyType,
    /// Form fields, used when `body_type` is [`BodyType::Form`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Vec<KeyValuePair>>,
    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Assertions evaluated against the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Assertion>,
}

impl ApiRequest {
    /// Creates a new request with a generated id and no body.
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: String::new(),
            body_type: BodyType::None,
            form_data: None,
            description: None,
            tests: Vec::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, url)
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_param(mut self, param: KeyValuePair) -> Self {
        self.params.push(param);
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, header: KeyValuePair) -> Self {
        self.headers.push(header);
        self
    }

    /// Sets a text-like body.
    #[must_use]
    pub fn with_body(mut self, body_type: BodyType, body: impl Into<String>) -> Self {
        self.body_type = body_type;
        self.body = body.into();
        self
    }

    /// Sets a form body.
    #[must_use]
    pub fn with_form_data(mut self, fields: Vec<KeyValuePair>) -> Self {
        self.body_type = BodyType::Form;
        self.form_data = Some(fields);
        self
    }

    /// Appends an assertion.
    #[must_use]
    pub fn with_test(mut self, assertion: Assertion) -> Self {
        self.tests.push(assertion);
        self
    }

    /// Enabled query parameters in declared order.
    pub fn enabled_params(&self) -> impl Iterator<Item = &KeyValuePair> {
        enabled(&self.params)
    }

    /// Enabled headers in declared order.
    pub fn enabled_headers(&self) -> impl Iterator<Item = &KeyValuePair> {
        enabled(&self.headers)
    }

    /// Enabled form fields in declared order.
    pub fn enabled_form_data(&self) -> impl Iterator<Item = &KeyValuePair> {
        self.form_data.as_deref().map(enabled).into_iter().flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_request() {
        let req = ApiRequest::get("Users", "https://api.example.com/users");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.body_type, BodyType::None);
        assert_eq!(req.id.len(), 36);
    }

    #[test]
    fn test_native_field_names() {
        let req = ApiRequest::new("Create", HttpMethod::Post, "/users")
            .with_id("r1")
            .with_body(BodyType::Json, "{}");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["bodyType"], "json");
        assert_eq!(json["method"], "POST");
        assert!(json.get("formData").is_none());
        assert!(json.get("tests").is_none());
    }

    #[test]
    fn test_minimal_document_deserializes() {
        let req: ApiRequest =
            serde_json::from_str(r#"{"id": "1", "name": "Ping", "url": "/ping"}"#).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_enabled_form_data() {
        let req = ApiRequest::new("Login", HttpMethod::Post, "/login").with_form_data(vec![
            KeyValuePair::new("user", "ada"),
            KeyValuePair::disabled("debug", "1"),
        ]);
        let keys: Vec<_> = req.enabled_form_data().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["user"]);
    }

    #[test]
    fn test_body_type_from_media_type() {
        assert_eq!(BodyType::from_media_type("application/json"), BodyType::Json);
        assert_eq!(
            BodyType::from_media_type("application/x-www-form-urlencoded"),
            BodyType::Form
        );
        assert_eq!(BodyType::from_media_type("multipart/form-data"), BodyType::Form);
        assert_eq!(BodyType::from_media_type("application/xml"), BodyType::Xml);
        assert_eq!(BodyType::from_media_type("text/csv"), BodyType::Text);
    }
}
