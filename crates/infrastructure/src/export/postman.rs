//! Postman Collection v2.1 exporter.
//!
//! The inverse of the importer's walk: each folder becomes an item with
//! nested `item`, each request a leaf with a `request`. Disabled pairs are
//! not written.

use probe_domain::collection::{Collection, Folder};
use probe_domain::request::{ApiRequest, BodyType, KeyValuePair};

use crate::import::postman::types::{
    POSTMAN_SCHEMA, PostmanBody, PostmanBodyOptions, PostmanCollection, PostmanDescription,
    PostmanFormParam, PostmanHeader, PostmanInfo, PostmanItem, PostmanQueryParam,
    PostmanRawOptions, PostmanRequest, PostmanUrl, PostmanUrlStructured,
};

/// Postman v2.1 exporter.
pub struct PostmanExporter;

impl PostmanExporter {
    /// Maps one collection onto a Postman document.
    #[must_use]
    pub fn export(collection: &Collection) -> PostmanCollection {
        PostmanCollection {
            info: PostmanInfo {
                name: collection.name.clone(),
                postman_id: Some(collection.id.clone()),
                description: collection
                    .description
                    .clone()
                    .map(PostmanDescription::Text),
                schema: Some(POSTMAN_SCHEMA.to_string()),
            },
            item: Self::items(&collection.requests, &collection.folders),
            variable: Vec::new(),
        }
    }

    fn items(requests: &[ApiRequest], folders: &[Folder]) -> Vec<PostmanItem> {
        requests
            .iter()
            .map(Self::request_item)
            .chain(folders.iter().map(|folder| PostmanItem {
                id: Some(folder.id.clone()),
                name: folder.name.clone(),
                description: None,
                item: Some(Self::items(&folder.requests, &folder.folders)),
                request: None,
            }))
            .collect()
    }

    fn request_item(request: &ApiRequest) -> PostmanItem {
        PostmanItem {
            id: Some(request.id.clone()),
            name: request.name.clone(),
            description: None,
            item: None,
            request: Some(PostmanRequest {
                method: request.method.as_str().to_string(),
                url: Self::url(request),
                header: request
                    .enabled_headers()
                    .map(|h| PostmanHeader {
                        key: h.key.clone(),
                        value: h.value.clone(),
                        disabled: false,
                    })
                    .collect(),
                body: Self::body(request),
                description: request.description.clone().map(PostmanDescription::Text),
            }),
        }
    }

    fn url(request: &ApiRequest) -> PostmanUrl {
        let query: Vec<PostmanQueryParam> = request
            .enabled_params()
            .map(|p| PostmanQueryParam {
                key: Some(p.key.clone()),
                value: Some(p.value.clone()),
                disabled: false,
            })
            .collect();
        if query.is_empty() {
            return PostmanUrl::Simple(request.url.clone());
        }

        // Tokens stay readable in `raw`, so the query is not url-encoded here.
        let rendered = query
            .iter()
            .map(|q| {
                format!(
                    "{}={}",
                    q.key.as_deref().unwrap_or_default(),
                    q.value.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if request.url.contains('?') { '&' } else { '?' };
        PostmanUrl::Structured(PostmanUrlStructured {
            raw: Some(format!("{}{separator}{rendered}", request.url)),
            query,
            ..PostmanUrlStructured::default()
        })
    }

    fn body(request: &ApiRequest) -> Option<PostmanBody> {
        let raw_body = |language: &str| PostmanBody {
            mode: "raw".to_string(),
            raw: Some(request.body.clone()),
            urlencoded: Vec::new(),
            formdata: Vec::new(),
            options: Some(PostmanBodyOptions {
                raw: Some(PostmanRawOptions {
                    language: Some(language.to_string()),
                }),
            }),
        };

        match request.body_type {
            BodyType::None => None,
            BodyType::Json => Some(raw_body("json")),
            BodyType::Text => Some(raw_body("text")),
            BodyType::Xml => Some(raw_body("xml")),
            BodyType::Form => Some(PostmanBody {
                mode: "urlencoded".to_string(),
                raw: None,
                urlencoded: request.enabled_form_data().map(form_param).collect(),
                formdata: Vec::new(),
                options: None,
            }),
        }
    }
}

fn form_param(pair: &KeyValuePair) -> PostmanFormParam {
    PostmanFormParam {
        key: pair.key.clone(),
        value: Some(pair.value.clone()),
        param_type: None,
        disabled: false,
    }
}
