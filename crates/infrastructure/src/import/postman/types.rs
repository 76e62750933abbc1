//! Postman Collection v2.1 Type Definitions
//!
//! These types are shared by the importer and the exporter. Every optional
//! field uses `#[serde(default)]` so documents written by older Postman
//! versions still load.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema URL written into exported collections.
pub const POSTMAN_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Root structure for Postman Collection v2.1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanCollection {
    pub info: PostmanInfo,
    #[serde(default)]
    pub item: Vec<PostmanItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable: Vec<PostmanVariable>,
}

/// Collection metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanInfo {
    pub name: String,
    #[serde(rename = "_postman_id", default, skip_serializing_if = "Option::is_none")]
    pub postman_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<PostmanDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// A description is either plain text or a `{content, type}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostmanDescription {
    Text(String),
    Rich {
        #[serde(default)]
        content: String,
    },
}

impl PostmanDescription {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Rich { content: text } => text,
        }
    }
}

/// An item can be either a folder (containing more items) or a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<PostmanDescription>,
    /// If present, this item is a folder containing sub-items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Vec<Self>>,
    /// If present, this item is a request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<PostmanRequest>,
}

/// Postman Request definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanRequest {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub url: PostmanUrl,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<PostmanHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PostmanBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<PostmanDescription>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// URL can be either a simple string or a structured object
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PostmanUrl {
    #[default]
    Empty,
    Simple(String),
    Structured(PostmanUrlStructured),
}

/// Structured URL object
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostmanUrlStructured {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_list")]
    pub host: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_list")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<PostmanQueryParam>,
}

/// Postman writes `host` and `path` either as a list of segments or as one string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Segments {
        One(String),
        Many(Vec<Value>),
    }

    Ok(match Segments::deserialize(deserializer)? {
        Segments::One(segment) => vec![segment],
        Segments::Many(segments) => segments
            .into_iter()
            .filter_map(|segment| match segment {
                Value::String(s) => Some(s),
                Value::Object(o) => o.get("value").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
    })
}

/// Query parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanQueryParam {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// Request header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanHeader {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanBody {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urlencoded: Vec<PostmanFormParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formdata: Vec<PostmanFormParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PostmanBodyOptions>,
}

/// Form parameter (`urlencoded` and `formdata` modes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanFormParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

impl PostmanFormParam {
    /// Returns true for `formdata` file fields.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.param_type.as_deref() == Some("file")
    }
}

/// Body options (e.g., raw language)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanBodyOptions {
    #[serde(default)]
    pub raw: Option<PostmanRawOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanRawOptions {
    #[serde(default)]
    pub language: Option<String>,
}

/// Variable definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanVariable {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}
