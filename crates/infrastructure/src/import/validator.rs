//! Structural validation of `OpenAPI` 3 and Swagger 2 documents.
//!
//! The validator is a linter: it never fails, it only reports. Every rule is
//! checked independently so one broken section does not hide findings in the
//! others. Only error-severity findings block an import.

use probe_domain::validation::ValidationError;
use serde_json::{Map, Value};

const OPERATION_KEYS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// Path-item fields that are not operations and are never reported.
const PATH_ITEM_FIELDS: [&str; 5] = ["parameters", "summary", "description", "servers", "$ref"];

/// Validates an `OpenAPI` 3 or Swagger 2 document.
///
/// Returns an empty list for a structurally sound document. A non-object
/// input yields exactly one error at `$`.
#[must_use]
pub fn validate_openapi(document: &Value) -> Vec<ValidationError> {
    let Some(root) = document.as_object() else {
        return vec![ValidationError::error(
            "$",
            format!("document must be an object, got {}", kind_of(document)),
        )];
    };

    let mut findings = Vec::new();
    check_version(root, &mut findings);
    check_info(root, &mut findings);
    check_paths(root, &mut findings);
    check_servers(root, &mut findings);
    findings
}

fn check_version(root: &Map<String, Value>, findings: &mut Vec<ValidationError>) {
    match (root.get("openapi"), root.get("swagger")) {
        (None, None) => findings.push(ValidationError::error(
            "openapi",
            "missing version field: expected `openapi` or `swagger`",
        )),
        (Some(_), Some(_)) => findings.push(ValidationError::error(
            "$",
            "only one of `openapi` and `swagger` may be present",
        )),
        (Some(Value::String(version)), None) => {
            if !version.starts_with("3.") {
                findings.push(ValidationError::warning(
                    "openapi",
                    format!("unsupported OpenAPI version {version}, expected 3.x"),
                ));
            }
        }
        (Some(other), None) => findings.push(ValidationError::error(
            "openapi",
            format!("version must be a string, got {}", kind_of(other)),
        )),
        (None, Some(version)) => {
            if version.as_str() != Some("2.0") {
                findings.push(ValidationError::error(
                    "swagger",
                    format!("swagger version must be \"2.0\", got {version}"),
                ));
            }
        }
    }
}

fn check_info(root: &Map<String, Value>, findings: &mut Vec<ValidationError>) {
    match root.get("info") {
        None => findings.push(ValidationError::error("info", "missing required field")),
        Some(Value::Object(info)) => {
            if !info.contains_key("title") {
                findings.push(ValidationError::warning("info.title", "missing API title"));
            }
        }
        Some(other) => findings.push(ValidationError::error(
            "info",
            format!("must be an object, got {}", kind_of(other)),
        )),
    }
}

fn check_paths(root: &Map<String, Value>, findings: &mut Vec<ValidationError>) {
    let paths = match root.get("paths") {
        None => {
            findings.push(ValidationError::error("paths", "missing required field"));
            return;
        }
        Some(Value::Object(paths)) => paths,
        Some(other) => {
            findings.push(ValidationError::error(
                "paths",
                format!("must be an object, got {}", kind_of(other)),
            ));
            return;
        }
    };

    if paths.is_empty() {
        findings.push(ValidationError::warning("paths", "no paths defined"));
    }

    for (path, item) in paths {
        let locator = format!("paths.{path}");
        if !path.starts_with('/') {
            findings.push(ValidationError::error(
                &locator,
                format!("path must start with /, got {path:?}"),
            ));
        }
        let Some(item) = item.as_object() else {
            continue;
        };
        for key in item.keys() {
            let lower = key.to_ascii_lowercase();
            if OPERATION_KEYS.contains(&lower.as_str())
                || PATH_ITEM_FIELDS.contains(&key.as_str())
                || key.starts_with("x-")
            {
                continue;
            }
            findings.push(ValidationError::warning(
                format!("{locator}.{key}"),
                format!("unsupported HTTP method {key:?}, operation will be skipped"),
            ));
        }
    }
}

fn check_servers(root: &Map<String, Value>, findings: &mut Vec<ValidationError>) {
    let Some(servers) = root.get("servers").and_then(Value::as_array) else {
        return;
    };
    for (index, server) in servers.iter().enumerate() {
        let Some(url) = server.get("url") else {
            continue;
        };
        let valid = url.as_str().is_some_and(|u| u.starts_with("http"));
        if !valid {
            findings.push(ValidationError::warning(
                format!("servers[{index}].url"),
                "server url should be an absolute http(s) URL",
            ));
        }
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use probe_domain::validation::{Severity, has_validation_errors};
    use serde_json::json;

    fn errors(findings: &[ValidationError]) -> Vec<&ValidationError> {
        findings.iter().filter(|f| f.is_error()).collect()
    }

    #[test]
    fn test_minimal_document_has_no_errors() {
        let findings = validate_openapi(&json!({
            "openapi": "3.0.0",
            "info": {"title": "API"},
            "paths": {"/": {"get": {}}}
        }));
        assert!(!has_validation_errors(&findings), "{findings:?}");
    }

    #[test]
    fn test_missing_paths() {
        let findings = validate_openapi(&json!({"openapi": "3.0.0", "info": {}}));
        assert!(findings.iter().any(|f| f.path == "paths" && f.is_error()));
        assert!(findings.iter().any(|f| f.path == "info.title" && !f.is_error()));
    }

    #[test]
    fn test_path_must_start_with_slash() {
        let findings =
            validate_openapi(&json!({"openapi": "3.0.0", "info": {}, "paths": {"invalid": {}}}));
        let errors = errors(&findings);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "paths.invalid");
        assert!(errors[0].message.contains("start with /"));
    }

    #[test]
    fn test_non_object_inputs() {
        for document in [Value::Null, json!([]), json!("openapi: 3.0.0"), json!(42)] {
            let findings = validate_openapi(&document);
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].path, "$");
            assert_eq!(findings[0].severity, Severity::Error);
            assert!(findings[0].message.contains("object"));
        }
    }

    #[test]
    fn test_rules_are_independent() {
        let findings = validate_openapi(&json!({"info": "nope", "paths": []}));
        let paths: Vec<_> = errors(&findings).iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["openapi", "info", "paths"]);
    }

    #[test]
    fn test_version_rules() {
        let findings = validate_openapi(&json!({"openapi": "2.5", "info": {"title": "x"}, "paths": {"/a": {}}}));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);

        let findings = validate_openapi(&json!({"swagger": "1.2", "info": {"title": "x"}, "paths": {"/a": {}}}));
        assert_eq!(errors(&findings)[0].path, "swagger");

        let findings = validate_openapi(&json!({
            "openapi": "3.0.0", "swagger": "2.0", "info": {"title": "x"}, "paths": {"/a": {}}
        }));
        assert_eq!(errors(&findings)[0].path, "$");
    }

    #[test]
    fn test_unknown_method_is_warning() {
        let findings = validate_openapi(&json!({
            "openapi": "3.0.0",
            "info": {"title": "x"},
            "paths": {"/a": {"GET": {}, "trace": {}, "parameters": [], "x-internal": true}}
        }));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "paths./a.trace");
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_empty_paths_is_warning() {
        let findings = validate_openapi(&json!({"openapi": "3.0.0", "info": {"title": "x"}, "paths": {}}));
        assert_eq!(findings, vec![ValidationError::warning("paths", "no paths defined")]);
    }

    #[test]
    fn test_server_urls() {
        let findings = validate_openapi(&json!({
            "openapi": "3.0.0",
            "info": {"title": "x"},
            "paths": {"/a": {}},
            "servers": [{"url": "https://api.test"}, {"url": "/v1"}, {"description": "no url"}, {"url": 5}]
        }));
        let paths: Vec<_> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["servers[1].url", "servers[3].url"]);
        assert!(!has_validation_errors(&findings));
    }

    #[test]
    fn test_deterministic() {
        let document = json!({"openapi": "3.0.0", "info": {}, "paths": {"bad": {"fetch": {}}}});
        assert_eq!(validate_openapi(&document), validate_openapi(&document));
    }
}
