//! `OpenAPI` 3.0 format exporter.
//!
//! Requests are grouped by `{path, method}`; the first request for a pair
//! wins. `{{token}}` path segments are restored to `{token}` templates with
//! matching path parameters. JSON and YAML are both produced from the typed
//! document below, so the two forms share one key order.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use probe_domain::collection::Collection;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const DEFAULT_TITLE: &str = "Probe Export";
const DEFAULT_VERSION: &str = "1.0.0";

static PATH_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").ok());

/// `OpenAPI` 3.0 exporter.
pub struct OpenApiExporter;

impl OpenApiExporter {
    /// Builds one `OpenAPI` document describing every request of `collections`.
    #[must_use]
    pub fn export(collections: &[Collection]) -> OpenApiDocument {
        let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
        let mut servers: Vec<Server> = Vec::new();

        for request in collections.iter().flat_map(Collection::requests_in_order) {
            let (server, path) = split_url(&request.url);
            if let Some(url) = server
                && !servers.iter().any(|s| s.url == url)
            {
                servers.push(Server { url });
            }

            let path = restore_templates(&path);
            let slot = paths.entry(path.clone()).or_default().slot(request.method);
            if slot.is_some() {
                debug!(%path, method = %request.method, request = %request.name, "Skipping duplicate operation");
                continue;
            }
            *slot = Some(Self::create_operation(request, &path));
        }

        let (title, description) = match collections {
            [only] => (only.name.clone(), only.description.clone()),
            _ => (DEFAULT_TITLE.to_string(), None),
        };

        OpenApiDocument {
            openapi: "3.0.3".to_string(),
            info: Info {
                title,
                version: DEFAULT_VERSION.to_string(),
                description,
            },
            servers,
            paths,
        }
    }

    fn create_operation(request: &ApiRequest, path: &str) -> Operation {
        let mut parameters: Vec<Parameter> = extract_path_params(path)
            .into_iter()
            .map(|name| Parameter {
                name,
                location: "path",
                required: true,
                schema: Schema::of("string"),
                example: None,
            })
            .collect();

        parameters.extend(request.enabled_params().map(|param| Parameter {
            name: param.key.clone(),
            location: "query",
            required: false,
            schema: Schema::of("string"),
            example: Some(param.value.clone()),
        }));

        // Content-Type is described by requestBody.
        parameters.extend(
            request
                .enabled_headers()
                .filter(|header| !header.key.eq_ignore_ascii_case("content-type"))
                .map(|header| Parameter {
                    name: header.key.clone(),
                    location: "header",
                    required: false,
                    schema: Schema::of("string"),
                    example: Some(header.value.clone()),
                }),
        );

        Operation {
            operation_id: Some(request.id.clone()),
            summary: Some(request.name.clone()),
            description: request.description.clone(),
            parameters,
            request_body: create_request_body(request),
            responses: default_responses(),
        }
    }
}

/// Splits a request URL into its server part and its path.
///
/// A leading `{{token}}` is treated as the server, so `{{base}}/users`
/// exports as server `{{base}}` and path `/users`.
fn split_url(url: &str) -> (Option<String>, String) {
    let url = url.split(['?', '#']).next().unwrap_or_default();

    let (server, path) = if let Some(scheme_end) = url.find("://") {
        let authority = scheme_end + 3;
        let path_start = url[authority..]
            .find('/')
            .map_or(url.len(), |i| authority + i);
        (Some(&url[..path_start]), &url[path_start..])
    } else if url.starts_with("{{") {
        let token_end = url.find("}}").map_or(url.len(), |i| i + 2);
        (Some(&url[..token_end]), &url[token_end..])
    } else {
        (None, url)
    };

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    (server.filter(|s| !s.is_empty()).map(str::to_string), path)
}

/// Rewrites `{{param}}` tokens to `{param}` path templates.
fn restore_templates(path: &str) -> String {
    PATH_TOKEN.as_ref().map_or_else(
        || path.to_string(),
        |pattern| pattern.replace_all(path, "{$1}").into_owned(),
    )
}

fn extract_path_params(path: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut in_param = false;
    let mut current = String::new();

    for ch in path.chars() {
        match ch {
            '{' => {
                in_param = true;
                current.clear();
            }
            '}' => {
                if in_param && !current.is_empty() && !params.contains(&current) {
                    params.push(current.clone());
                }
                in_param = false;
            }
            _ if in_param => current.push(ch),
            _ => {}
        }
    }

    params
}

fn create_request_body(request: &ApiRequest) -> Option<RequestBody> {
    let media_type = request.body_type.content_type()?;

    let (schema, example) = match request.body_type {
        BodyType::None => return None,
        BodyType::Json => {
            let example = serde_json::from_str::<Value>(&request.body)
                .unwrap_or_else(|_| Value::String(request.body.clone()));
            (Schema::of(json_type(&example)), example)
        }
        BodyType::Text | BodyType::Xml => (Schema::of("string"), Value::String(request.body.clone())),
        BodyType::Form => {
            let mut schema = Schema::of("object");
            let mut example = serde_json::Map::new();
            for field in request.enabled_form_data() {
                schema
                    .properties
                    .insert(field.key.clone(), Schema::of("string"));
                example.insert(field.key.clone(), Value::String(field.value.clone()));
            }
            (schema, Value::Object(example))
        }
    };

    let mut content = BTreeMap::new();
    content.insert(
        media_type.to_string(),
        MediaType {
            schema,
            example: Some(example),
        },
    );
    Some(RequestBody {
        required: true,
        content,
    })
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::String(_) | Value::Null => "string",
    }
}

fn default_responses() -> BTreeMap<String, Response> {
    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: "Successful response".to_string(),
        },
    );
    responses
}

/// Serializable `OpenAPI` 3.0 document.
#[derive(Debug, Serialize)]
pub struct OpenApiDocument {
    openapi: String,
    info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    servers: Vec<Server>,
    paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Serialize)]
struct Info {
    title: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct Server {
    url: String,
}

#[derive(Debug, Serialize, Default)]
struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Operation>,
}

impl PathItem {
    const fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Options => &mut self.options,
        }
    }
}

#[allow(clippy::struct_field_names)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_body: Option<RequestBody>,
    responses: BTreeMap<String, Response>,
}

#[derive(Debug, Serialize)]
struct Parameter {
    name: String,
    #[serde(rename = "in")]
    location: &'static str,
    required: bool,
    schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<String>,
}

#[derive(Debug, Serialize)]
struct Schema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Self>,
}

impl Schema {
    const fn of(schema_type: &'static str) -> Self {
        Self {
            schema_type,
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestBody {
    required: bool,
    content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Serialize)]
struct MediaType {
    schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    description: String,
}
