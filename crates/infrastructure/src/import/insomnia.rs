//! Insomnia export import
//!
//! An Insomnia export is a flat `resources` list linked by `parentId`. The
//! tree is rebuilt in three steps:
//!
//! 1. every `request` and `request_group` goes into an arena, indexed by id
//! 2. parent references are resolved to arena indices; dangling references
//!    and cycles are cut so the affected node becomes a root
//! 3. child lists are built once, in array order, and materialized
//!    depth-first into folders and requests
//!
//! Roots are attached to the workspace they point at, or to the first
//! workspace when their parent is unknown.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use probe_domain::collection::{Collection, Folder};
use probe_domain::format::SpecFormat;
use probe_domain::id::id_or_generate;
use probe_domain::request::{ApiRequest, BodyType, HttpMethod, KeyValuePair};
use probe_domain::validation::ValidationError;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::ImportError;

const FALLBACK_NAME: &str = "Insomnia Import";

/// Matches Insomnia's `{{ _.name }}` environment references.
static ENV_REFERENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*_\.([A-Za-z0-9_.\-]+)\s*\}\}").ok());

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_type")]
    kind: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    headers: Vec<Pair>,
    #[serde(default)]
    parameters: Vec<Pair>,
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Body {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    params: Vec<Pair>,
}

#[derive(Debug, Deserialize)]
struct Pair {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Request,
    Group,
}

struct Node {
    kind: NodeKind,
    resource: Resource,
    /// Arena index of the parent group, `None` for roots.
    parent: Option<usize>,
}

/// Converts an Insomnia export into one collection per workspace.
///
/// # Errors
///
/// Returns [`ImportError::InvalidFormat`] if `resources` is missing.
pub fn import_insomnia(
    document: &Value,
    warnings: &mut Vec<ValidationError>,
) -> Result<Vec<Collection>, ImportError> {
    let resources = document
        .get("resources")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::InvalidFormat {
            format: SpecFormat::Insomnia.display_name(),
            message: "missing resources array".to_string(),
        })?;

    let mut workspaces: Vec<(String, String)> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();

    for (position, raw) in resources.iter().enumerate() {
        let locator = format!("resources[{position}]");
        let resource = match Resource::deserialize(raw) {
            Ok(resource) => resource,
            Err(e) => {
                warnings.push(ValidationError::warning(locator, format!("skipped: {e}")));
                continue;
            }
        };
        let kind = match resource.kind.as_str() {
            "request" => NodeKind::Request,
            "request_group" => NodeKind::Group,
            "workspace" => {
                workspaces.push((resource.id.clone(), resource.name.clone()));
                continue;
            }
            "grpc_request" | "websocket_request" => {
                warnings.push(ValidationError::warning(
                    locator,
                    format!("{} {:?} is not supported, skipped", resource.kind, resource.name),
                ));
                continue;
            }
            _ => continue,
        };
        nodes.push(Node {
            kind,
            resource,
            parent: None,
        });
    }

    let index = index_by_id(&nodes, warnings);
    link_parents(&mut nodes, &index, warnings);
    break_cycles(&mut nodes, warnings);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    if workspaces.is_empty() {
        workspaces.push((String::new(), FALLBACK_NAME.to_string()));
    }
    let mut builder = TreeBuilder {
        nodes: &nodes,
        children: &children,
        visited: HashSet::new(),
    };

    let mut collections = Vec::with_capacity(workspaces.len());
    for (position, (workspace_id, workspace_name)) in workspaces.iter().enumerate() {
        let owned = roots.iter().copied().filter(|&root| {
            let parent = nodes[root].resource.parent_id.as_deref();
            let named = workspaces.iter().position(|(id, _)| Some(id.as_str()) == parent);
            named.unwrap_or(0) == position
        });

        let mut collection = Collection::new(workspace_name.clone())
            .with_id(id_or_generate(Some(workspace_id.as_str())));
        for root in owned.collect::<Vec<_>>() {
            builder.attach(root, &mut collection.requests, &mut collection.folders);
        }
        debug!(
            collection = %collection.name,
            requests = collection.request_count(),
            "Rebuilt Insomnia workspace"
        );
        collections.push(collection);
    }

    Ok(collections)
}

fn index_by_id(nodes: &[Node], warnings: &mut Vec<ValidationError>) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.contains_key(&node.resource.id) {
            warnings.push(ValidationError::warning(
                format!("resources.{}", node.resource.id),
                "duplicate resource id, later entry kept as a separate node",
            ));
        } else {
            index.insert(node.resource.id.clone(), i);
        }
    }
    index
}

fn link_parents(
    nodes: &mut [Node],
    index: &HashMap<String, usize>,
    warnings: &mut Vec<ValidationError>,
) {
    for i in 0..nodes.len() {
        let Some(parent_id) = nodes[i].resource.parent_id.as_deref() else {
            continue;
        };
        let Some(&parent) = index.get(parent_id) else {
            continue;
        };
        if nodes[parent].kind == NodeKind::Group {
            nodes[i].parent = Some(parent);
        } else {
            warnings.push(ValidationError::warning(
                format!("resources.{}", nodes[i].resource.id),
                "parent is a request, treated as a root",
            ));
        }
    }
}

/// Cuts every parent cycle so each node reaches a root.
///
/// Walks each node's ancestor chain with a visited set; the link that closes
/// a loop is removed and the node holding it becomes a root.
fn break_cycles(nodes: &mut [Node], warnings: &mut Vec<ValidationError>) {
    for start in 0..nodes.len() {
        let mut visited = HashSet::from([start]);
        let mut current = start;
        while let Some(parent) = nodes[current].parent {
            if !visited.insert(parent) {
                nodes[current].parent = None;
                warnings.push(ValidationError::warning(
                    format!("resources.{}", nodes[current].resource.id),
                    "cyclic parent reference, treated as a root",
                ));
                break;
            }
            current = parent;
        }
    }
}

struct TreeBuilder<'a> {
    nodes: &'a [Node],
    children: &'a [Vec<usize>],
    visited: HashSet<usize>,
}

impl TreeBuilder<'_> {
    fn attach(&mut self, index: usize, requests: &mut Vec<ApiRequest>, folders: &mut Vec<Folder>) {
        if !self.visited.insert(index) {
            return;
        }
        let node = &self.nodes[index];
        match node.kind {
            NodeKind::Request => requests.push(map_request(&node.resource)),
            NodeKind::Group => {
                let mut folder = Folder::new(normalize(&node.resource.name))
                    .with_id(id_or_generate(Some(node.resource.id.as_str())));
                for &child in &self.children[index] {
                    self.attach(child, &mut folder.requests, &mut folder.folders);
                }
                folders.push(folder);
            }
        }
    }
}

fn map_request(resource: &Resource) -> ApiRequest {
    let method = resource
        .method
        .as_deref()
        .and_then(|m| m.parse().ok())
        .unwrap_or(HttpMethod::Get);
    let mut request = ApiRequest::new(normalize(&resource.name), method, normalize(&resource.url))
        .with_id(id_or_generate(Some(resource.id.as_str())));
    request.params = pairs(&resource.parameters);
    request.headers = pairs(&resource.headers);
    if !resource.description.is_empty() {
        request.description = Some(resource.description.clone());
    }

    if let Some(body) = &resource.body {
        let mime_type = body.mime_type.as_deref().unwrap_or_default();
        match BodyType::from_media_type(mime_type) {
            BodyType::Form => {
                let fields = body
                    .params
                    .iter()
                    .filter(|p| p.kind.as_deref() != Some("file"))
                    .collect::<Vec<_>>();
                request.body_type = BodyType::Form;
                request.form_data = Some(fields.into_iter().map(pair).collect());
            }
            BodyType::None => {
                if let Some(text) = body.text.as_deref().filter(|t| !t.is_empty()) {
                    request.body_type = BodyType::Text;
                    request.body = normalize(text);
                }
            }
            body_type => {
                request.body_type = body_type;
                request.body = normalize(body.text.as_deref().unwrap_or_default());
            }
        }
    }
    request
}

fn pairs(source: &[Pair]) -> Vec<KeyValuePair> {
    source.iter().map(pair).collect()
}

fn pair(source: &Pair) -> KeyValuePair {
    KeyValuePair {
        key: source.name.clone(),
        value: normalize(&source.value),
        enabled: !source.disabled,
    }
}

/// Rewrites `{{ _.name }}` to `{{name}}`.
fn normalize(text: &str) -> String {
    match ENV_REFERENCE.as_ref() {
        Some(pattern) if text.contains("{{") => pattern.replace_all(text, "{{$1}}").into_owned(),
        _ => text.to_string(),
    }
}
