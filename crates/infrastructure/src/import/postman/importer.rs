//! Postman Importer
//!
//! Walks the recursive `item` tree depth-first, preserving declared order,
//! and maps folders and request leaves onto the collection model. Postman's
//! `{{var}}` syntax is the same token syntax the resolver uses, so strings
//! pass through unchanged.

use probe_domain::collection::{Collection, Folder};
use probe_domain::format::SpecFormat;
use probe_domain::id::id_or_generate;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair, find_ignore_case};
use probe_domain::validation::ValidationError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{
    PostmanBody, PostmanCollection, PostmanFormParam, PostmanItem, PostmanRequest, PostmanUrl,
    PostmanUrlStructured,
};
use crate::import::ImportError;

/// Converts a Postman v2.1 document into one collection, or a JSON array of
/// such documents into one collection each, in order.
///
/// Converter warnings (skipped items, unsupported body modes) are appended
/// to `warnings`.
///
/// # Errors
///
/// Returns [`ImportError::InvalidFormat`] if a document does not match the
/// Postman collection schema.
pub fn import_postman(
    document: &Value,
    warnings: &mut Vec<ValidationError>,
) -> Result<Vec<Collection>, ImportError> {
    match document.as_array() {
        Some(documents) => documents
            .iter()
            .enumerate()
            .map(|(index, document)| import_one(document, &format!("[{index}]."), warnings))
            .collect(),
        None => Ok(vec![import_one(document, "", warnings)?]),
    }
}

fn import_one(
    document: &Value,
    prefix: &str,
    warnings: &mut Vec<ValidationError>,
) -> Result<Collection, ImportError> {
    let postman = PostmanCollection::deserialize(document).map_err(|e| ImportError::InvalidFormat {
        format: SpecFormat::Postman.display_name(),
        message: format!("{prefix}{e}"),
    })?;

    if !postman.variable.is_empty() {
        warnings.push(ValidationError::warning(
            format!("{prefix}variable"),
            format!(
                "{} collection variable(s) not imported; define them as globals or in an environment",
                postman.variable.len()
            ),
        ));
    }

    let mut mapper = ItemMapper { warnings };
    let (requests, folders) = mapper.items(&postman.item, &format!("{prefix}item"));

    let mut collection = Collection::new(postman.info.name)
        .with_id(id_or_generate(postman.info.postman_id.as_deref()));
    collection.description = postman.info.description.map(|d| d.text().to_string());
    collection.requests = requests;
    collection.folders = folders;

    debug!(
        collection = %collection.name,
        requests = collection.request_count(),
        "Mapped Postman collection"
    );
    Ok(collection)
}

struct ItemMapper<'a> {
    warnings: &'a mut Vec<ValidationError>,
}

impl ItemMapper<'_> {
    fn items(&mut self, items: &[PostmanItem], path: &str) -> (Vec<ApiRequest>, Vec<Folder>) {
        let mut requests = Vec::new();
        let mut folders = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let locator = format!("{path}[{index}]");
            if let Some(children) = &item.item {
                let (child_requests, child_folders) =
                    self.items(children, &format!("{locator}.item"));
                let mut folder =
                    Folder::new(item.name.clone()).with_id(id_or_generate(item.id.as_deref()));
                folder.requests = child_requests;
                folder.folders = child_folders;
                folders.push(folder);
            } else if let Some(request) = &item.request {
                requests.push(self.request(item, request, &locator));
            } else {
                self.warnings.push(ValidationError::warning(
                    locator,
                    format!("item {:?} has neither a request nor sub-items, skipped", item.name),
                ));
            }
        }

        (requests, folders)
    }

    fn request(&mut self, item: &PostmanItem, source: &PostmanRequest, path: &str) -> ApiRequest {
        let method = source.method.parse().unwrap_or_else(|_| {
            self.warnings.push(ValidationError::warning(
                format!("{path}.request.method"),
                format!("unsupported method {:?}, using GET", source.method),
            ));
            HttpMethod::Get
        });

        let (url, params) = split_url(&source.url);
        let mut request = ApiRequest::new(item.name.clone(), method, url)
            .with_id(id_or_generate(item.id.as_deref()));
        request.params = params;
        request.headers = source
            .header
            .iter()
            .map(|h| pair(h.key.clone(), h.value.clone(), h.disabled))
            .collect();
        request.description = item
            .description
            .as_ref()
            .or(source.description.as_ref())
            .map(|d| d.text().to_string());

        if let Some(body) = &source.body {
            self.body(&mut request, body, path);
        }
        request
    }

    fn body(&mut self, request: &mut ApiRequest, body: &PostmanBody, path: &str) {
        match body.mode.as_str() {
            "raw" => {
                let raw = body.raw.clone().unwrap_or_default();
                let language = body
                    .options
                    .as_ref()
                    .and_then(|o| o.raw.as_ref())
                    .and_then(|r| r.language.as_deref());
                let body_type = match language {
                    Some("json") => BodyType::Json,
                    Some("xml") => BodyType::Xml,
                    Some(_) => BodyType::Text,
                    None => find_ignore_case(&request.headers, "content-type")
                        .map(BodyType::from_media_type)
                        .filter(|t| t.is_text_like())
                        .unwrap_or(if raw.is_empty() { BodyType::None } else { BodyType::Text }),
                };
                request.body_type = body_type;
                request.body = raw;
            }
            "urlencoded" => {
                request.body_type = BodyType::Form;
                request.form_data = Some(self.form_fields(&body.urlencoded, path));
            }
            "formdata" => {
                request.body_type = BodyType::Form;
                request.form_data = Some(self.form_fields(&body.formdata, path));
            }
            mode => self.warnings.push(ValidationError::warning(
                format!("{path}.request.body"),
                format!("body mode {mode:?} is not supported, body dropped"),
            )),
        }
    }

    fn form_fields(&mut self, fields: &[PostmanFormParam], path: &str) -> Vec<KeyValuePair> {
        fields
            .iter()
            .filter(|field| {
                if field.is_file() {
                    self.warnings.push(ValidationError::warning(
                        format!("{path}.request.body"),
                        format!("file field {:?} skipped", field.key),
                    ));
                }
                !field.is_file()
            })
            .map(|field| {
                pair(
                    field.key.clone(),
                    field.value.clone().unwrap_or_default(),
                    field.disabled,
                )
            })
            .collect()
    }
}

fn pair(key: String, value: String, disabled: bool) -> KeyValuePair {
    KeyValuePair {
        key,
        value,
        enabled: !disabled,
    }
}

/// Splits a Postman URL into the base URL and its query parameters.
///
/// Structured query entries become params and are removed from the raw
/// string; a plain string URL is kept whole.
fn split_url(url: &PostmanUrl) -> (String, Vec<KeyValuePair>) {
    match url {
        PostmanUrl::Empty => (String::new(), Vec::new()),
        PostmanUrl::Simple(raw) => (raw.clone(), Vec::new()),
        PostmanUrl::Structured(structured) => {
            let params: Vec<KeyValuePair> = structured
                .query
                .iter()
                .filter_map(|q| {
                    let key = q.key.clone()?;
                    Some(pair(key, q.value.clone().unwrap_or_default(), q.disabled))
                })
                .collect();
            let base = structured.raw.clone().unwrap_or_else(|| assemble(structured));
            if params.is_empty() {
                (base, params)
            } else {
                let base = base.split_once('?').map_or(base.as_str(), |(b, _)| b).to_string();
                (base, params)
            }
        }
    }
}

fn assemble(url: &PostmanUrlStructured) -> String {
    let mut out = String::new();
    if let Some(protocol) = &url.protocol {
        out.push_str(protocol);
        out.push_str("://");
    }
    out.push_str(&url.host.join("."));
    if let Some(port) = &url.port {
        out.push(':');
        out.push_str(port);
    }
    if !url.path.is_empty() {
        out.push('/');
        out.push_str(&url.path.join("/"));
    }
    out
}
