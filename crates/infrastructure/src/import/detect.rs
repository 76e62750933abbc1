//! Format detection for parsed documents.

use probe_domain::format::SpecFormat;
use serde_json::Value;

/// Classifies a parsed JSON or YAML document.
///
/// Checks run in a fixed order and the first match wins:
///
/// 1. an array of objects that each carry `requests` or `folders` is native
/// 2. an object with both `info` and `item` is Postman, and so is a
///    non-empty array of such objects
/// 3. an object whose `resources` array elements all carry `_type` is Insomnia
/// 4. an object whose `openapi` key holds a string is `OpenAPI` 3
/// 5. an object whose `swagger` key equals `"2.0"` is Swagger 2
///
/// Anything else is [`SpecFormat::Unknown`].
#[must_use]
pub fn detect_format(value: &Value) -> SpecFormat {
    if is_native(value) {
        return SpecFormat::Native;
    }
    if let Some(documents) = value.as_array() {
        return if !documents.is_empty() && documents.iter().all(is_postman) {
            SpecFormat::Postman
        } else {
            SpecFormat::Unknown
        };
    }
    let Some(object) = value.as_object() else {
        return SpecFormat::Unknown;
    };

    if is_postman(value) {
        SpecFormat::Postman
    } else if object
        .get("resources")
        .and_then(Value::as_array)
        .is_some_and(|resources| resources.iter().all(|r| r.get("_type").is_some()))
    {
        SpecFormat::Insomnia
    } else if object.get("openapi").is_some_and(Value::is_string) {
        SpecFormat::OpenApi
    } else if object.get("swagger").and_then(Value::as_str) == Some("2.0") {
        SpecFormat::Swagger
    } else {
        SpecFormat::Unknown
    }
}

fn is_postman(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("info") && o.contains_key("item"))
}

fn is_native(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        items.iter().all(|item| {
            item.as_object()
                .is_some_and(|c| c.contains_key("requests") || c.contains_key("folders"))
        })
    })
}
