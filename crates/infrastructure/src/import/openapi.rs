//! `OpenAPI` 3 and Swagger 2 import
//!
//! Each `{path, method}` operation becomes one request. Requests are grouped
//! into one folder per top-level path segment; operations on `/` stay at the
//! collection root. Path templates `{id}` become `{{id}}` tokens.

use std::sync::LazyLock;

use probe_domain::collection::{Collection, Folder};
use probe_domain::format::SpecFormat;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};
use probe_domain::validation::ValidationError;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::ImportError;

/// Deepest schema nesting expanded when building a body skeleton.
const MAX_SCHEMA_DEPTH: usize = 6;

/// Longest `$ref` chain followed before giving up.
const MAX_REF_HOPS: usize = 16;

const DEFAULT_TITLE: &str = "Imported API";

static PATH_TEMPLATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").ok());

/// Converts a validated `OpenAPI` 3 or Swagger 2 document into one collection.
///
/// # Errors
///
/// Returns [`ImportError::InvalidFormat`] if the document has no `paths`
/// object; the validator rejects such documents before conversion.
pub fn import_openapi(
    document: &Value,
    format: SpecFormat,
    warnings: &mut Vec<ValidationError>,
) -> Result<Vec<Collection>, ImportError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| ImportError::InvalidFormat {
            format: format.display_name(),
            message: "missing paths object".to_string(),
        })?;

    let swagger = format == SpecFormat::Swagger;
    let converter = Converter {
        document,
        swagger,
        base: if swagger {
            swagger_base(document)
        } else {
            server_base(document)
        },
    };

    let info = document.get("info");
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE);
    let mut collection = Collection::new(title);
    collection.description = info
        .and_then(|i| i.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string);

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared: &[Value] = item
            .get("parameters")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice);

        for (key, operation) in item {
            let Some(method) = operation_method(key) else {
                continue;
            };
            let locator = format!("paths.{path}.{key}");
            let request = converter.request(path, method, operation, shared, &locator, warnings);
            match top_segment(path) {
                Some(segment) => folder_for(&mut collection.folders, segment).requests.push(request),
                None => collection.requests.push(request),
            }
        }
    }

    debug!(
        collection = %collection.name,
        base = %converter.base,
        requests = collection.request_count(),
        "Mapped API description"
    );
    Ok(vec![collection])
}

fn operation_method(key: &str) -> Option<HttpMethod> {
    HttpMethod::all()
        .iter()
        .copied()
        .find(|m| m.operation_key().eq_ignore_ascii_case(key))
}

fn top_segment(path: &str) -> Option<&str> {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

fn folder_for<'a>(folders: &'a mut Vec<Folder>, name: &str) -> &'a mut Folder {
    let position = folders.iter().position(|f| f.name == name).unwrap_or_else(|| {
        folders.push(Folder::new(name));
        folders.len() - 1
    });
    &mut folders[position]
}

/// `servers[0].url` with server variables replaced by their defaults.
fn server_base(document: &Value) -> String {
    let Some(server) = document
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
    else {
        return String::new();
    };
    let mut url = server
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if let Some(variables) = server.get("variables").and_then(Value::as_object) {
        for (name, variable) in variables {
            if let Some(default) = variable.get("default").and_then(Value::as_str) {
                url = url.replace(&format!("{{{name}}}"), default);
            }
        }
    }
    url.trim_end_matches('/').to_string()
}

/// `schemes[0]://host + basePath`, or just `basePath` without a host.
fn swagger_base(document: &Value) -> String {
    let base_path = document
        .get("basePath")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let base = match document.get("host").and_then(Value::as_str) {
        Some(host) => {
            let scheme = document
                .get("schemes")
                .and_then(Value::as_array)
                .and_then(|s| s.first())
                .and_then(Value::as_str)
                .unwrap_or("https");
            format!("{scheme}://{host}{base_path}")
        }
        None => base_path.to_string(),
    };
    base.trim_end_matches('/').to_string()
}

/// Rewrites `{param}` path templates to `{{param}}` tokens.
fn to_tokens(path: &str) -> String {
    PATH_TEMPLATE.as_ref().map_or_else(
        || path.to_string(),
        |pattern| pattern.replace_all(path, "{{$1}}").into_owned(),
    )
}

struct Converter<'a> {
    document: &'a Value,
    swagger: bool,
    base: String,
}

impl Converter<'_> {
    fn request(
        &self,
        path: &str,
        method: HttpMethod,
        operation: &Value,
        shared: &[Value],
        locator: &str,
        warnings: &mut Vec<ValidationError>,
    ) -> ApiRequest {
        let name = ["summary", "operationId"]
            .iter()
            .find_map(|key| operation.get(*key).and_then(Value::as_str))
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| format!("{method} {path}"), str::to_string);

        let mut request = ApiRequest::new(name, method, format!("{}{}", self.base, to_tokens(path)));
        request.description = operation
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let own: &[Value] = operation
            .get("parameters")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice);
        let mut form_fields = Vec::new();

        for parameter in self.merge_parameters(shared, own) {
            let name = parameter
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            match parameter.get("in").and_then(Value::as_str) {
                Some("query") => request.params.push(KeyValuePair::new(name, self.parameter_value(parameter))),
                Some("header") => request.headers.push(KeyValuePair::new(name, self.parameter_value(parameter))),
                Some("formData") => form_fields.push(KeyValuePair::new(name, self.parameter_value(parameter))),
                Some("body") if self.swagger => {
                    let media_type = self.swagger_media_type(operation);
                    let sample = parameter
                        .get("schema")
                        .map_or(Value::Null, |schema| self.sample(schema, 0));
                    seed_body(&mut request, &media_type, &sample);
                }
                Some("cookie") => warnings.push(ValidationError::warning(
                    format!("{locator}.parameters.{name}"),
                    "cookie parameters are not imported",
                )),
                _ => {}
            }
        }

        if !form_fields.is_empty() {
            request.body_type = BodyType::Form;
            request.form_data = Some(form_fields);
        }

        if !self.swagger {
            if let Some(body) = operation.get("requestBody") {
                self.request_body(&mut request, self.resolve(body));
            }
        }
        request
    }

    /// Path-level parameters overlaid by operation-level ones with the same
    /// `name` and `in`.
    fn merge_parameters<'v>(&'v self, shared: &'v [Value], own: &'v [Value]) -> Vec<&'v Value> {
        let mut merged: Vec<&'v Value> = Vec::new();
        for parameter in shared.iter().chain(own) {
            let parameter = self.resolve(parameter);
            let key = (parameter.get("name"), parameter.get("in"));
            match merged
                .iter()
                .position(|m| (m.get("name"), m.get("in")) == key)
            {
                Some(position) => merged[position] = parameter,
                None => merged.push(parameter),
            }
        }
        merged
    }

    fn parameter_value(&self, parameter: &Value) -> String {
        let schema = parameter.get("schema").map(|s| self.resolve(s));
        let candidates = [
            parameter.get("example"),
            schema.and_then(|s| s.get("example")),
            parameter.get("default"),
            schema.and_then(|s| s.get("default")),
            parameter.get("enum").and_then(|e| e.get(0)),
            schema.and_then(|s| s.get("enum")).and_then(|e| e.get(0)),
        ];
        candidates
            .into_iter()
            .flatten()
            .next()
            .map(scalar_text)
            .unwrap_or_default()
    }

    fn swagger_media_type(&self, operation: &Value) -> String {
        [operation.get("consumes"), self.document.get("consumes")]
            .into_iter()
            .flatten()
            .filter_map(|c| c.get(0).and_then(Value::as_str))
            .next()
            .unwrap_or("application/json")
            .to_string()
    }

    fn request_body(&self, request: &mut ApiRequest, body: &Value) {
        let Some(content) = body.get("content").and_then(Value::as_object) else {
            return;
        };
        let chosen = content
            .iter()
            .find(|(media_type, _)| BodyType::from_media_type(media_type) == BodyType::Json)
            .or_else(|| content.iter().next());
        let Some((media_type, media)) = chosen else {
            return;
        };

        let example = media.get("example").cloned().or_else(|| {
            media
                .get("examples")
                .and_then(Value::as_object)
                .and_then(|examples| examples.values().next())
                .map(|example| self.resolve(example))
                .and_then(|example| example.get("value"))
                .cloned()
        });
        let sample = example.unwrap_or_else(|| {
            media
                .get("schema")
                .map_or(Value::Null, |schema| self.sample(schema, 0))
        });
        seed_body(request, media_type, &sample);
    }

    /// Builds a sample value: `example` wins, otherwise a skeleton from
    /// `type`/`properties`, expanded at most [`MAX_SCHEMA_DEPTH`] levels.
    fn sample(&self, schema: &Value, depth: usize) -> Value {
        if depth > MAX_SCHEMA_DEPTH {
            return Value::Null;
        }
        let schema = self.resolve(schema);
        if let Some(example) = schema.get("example") {
            return example.clone();
        }
        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            let mut merged = Map::new();
            for part in parts {
                if let Value::Object(fields) = self.sample(part, depth + 1) {
                    merged.extend(fields);
                }
            }
            return Value::Object(merged);
        }
        for key in ["oneOf", "anyOf"] {
            if let Some(first) = schema.get(key).and_then(|v| v.get(0)) {
                return self.sample(first, depth + 1);
            }
        }

        match schema.get("type").and_then(Value::as_str) {
            Some("string") => Value::String(String::new()),
            Some("integer" | "number") => Value::from(0),
            Some("boolean") => Value::Bool(false),
            Some("array") => Value::Array(Vec::new()),
            Some("object") | None if schema.get("properties").is_some() => {
                let mut fields = Map::new();
                if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                    for (name, property) in properties {
                        fields.insert(name.clone(), self.sample(property, depth + 1));
                    }
                }
                Value::Object(fields)
            }
            Some("object") => Value::Object(Map::new()),
            _ => Value::Null,
        }
    }

    /// Follows local `#/...` references; anything else is returned as is.
    fn resolve<'v>(&'v self, value: &'v Value) -> &'v Value {
        let mut current = value;
        for _ in 0..MAX_REF_HOPS {
            let Some(target) = current
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix('#'))
                .and_then(|pointer| self.document.pointer(pointer))
            else {
                break;
            };
            current = target;
        }
        current
    }
}

fn seed_body(request: &mut ApiRequest, media_type: &str, sample: &Value) {
    match BodyType::from_media_type(media_type) {
        BodyType::Form => {
            let fields = sample
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(key, value)| KeyValuePair::new(key, scalar_text(value)))
                        .collect()
                })
                .unwrap_or_default();
            request.body_type = BodyType::Form;
            request.form_data = Some(fields);
        }
        BodyType::Json => {
            request.body_type = BodyType::Json;
            request.body = if sample.is_null() {
                String::new()
            } else {
                serde_json::to_string_pretty(sample).unwrap_or_default()
            };
        }
        BodyType::None => {}
        text_like => {
            request.body_type = text_like;
            request.body = sample.as_str().unwrap_or_default().to_string();
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
