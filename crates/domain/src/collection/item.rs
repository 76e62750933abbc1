//! Collection tree types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_id;
use crate::request::ApiRequest;

/// A folder containing requests and other folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique identifier
    pub id: String,
    /// Folder name
    pub name: String,
    /// Requests directly inside this folder
    #[serde(default)]
    pub requests: Vec<ApiRequest>,
    /// Nested folders
    #[serde(default)]
    pub folders: Vec<Self>,
}

impl Folder {
    /// Creates a new empty folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            requests: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends a request.
    #[must_use]
    pub fn with_request(mut self, request: ApiRequest) -> Self {
        self.requests.push(request);
        self
    }

    /// Appends a nested folder.
    #[must_use]
    pub fn with_folder(mut self, folder: Self) -> Self {
        self.folders.push(folder);
        self
    }

    /// Returns every request under this folder in execution order.
    #[must_use]
    pub fn requests_in_order(&self) -> Vec<&ApiRequest> {
        let mut out = Vec::new();
        collect_requests(&self.requests, &self.folders, &mut out);
        out
    }

    /// Returns true if the folder holds neither requests nor folders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.folders.is_empty()
    }
}

/// A named tree of folders and requests; the unit of import and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Unique identifier
    pub id: String,
    /// Collection name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Requests at the collection root
    #[serde(default)]
    pub requests: Vec<ApiRequest>,
    /// Top-level folders
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Creation time, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Collection {
    /// Creates a new empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: None,
            requests: Vec::new(),
            folders: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends a root-level request.
    #[must_use]
    pub fn with_request(mut self, request: ApiRequest) -> Self {
        self.requests.push(request);
        self
    }

    /// Appends a top-level folder.
    #[must_use]
    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }

    /// Returns the total number of requests in the collection (recursive).
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests_in_order().len()
    }

    /// Returns every request in execution order.
    ///
    /// At each level the level's own requests come first, then each folder
    /// depth-first, all in declared order.
    #[must_use]
    pub fn requests_in_order(&self) -> Vec<&ApiRequest> {
        let mut out = Vec::new();
        collect_requests(&self.requests, &self.folders, &mut out);
        out
    }

    /// Finds a folder anywhere in the tree.
    #[must_use]
    pub fn find_folder(&self, id: &str) -> Option<&Folder> {
        find_folder_in(&self.folders, id)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new("New Collection")
    }
}

fn collect_requests<'a>(
    requests: &'a [ApiRequest],
    folders: &'a [Folder],
    out: &mut Vec<&'a ApiRequest>,
) {
    out.extend(requests.iter());
    for folder in folders {
        collect_requests(&folder.requests, &folder.folders, out);
    }
}

fn find_folder_in<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    folders.iter().find_map(|folder| {
        if folder.id == id {
            Some(folder)
        } else {
            find_folder_in(&folder.folders, id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Collection {
        Collection::new("My API")
            .with_request(ApiRequest::get("Health", "/health").with_id("r0"))
            .with_folder(
                Folder::new("Users")
                    .with_id("f1")
                    .with_request(ApiRequest::get("List", "/users").with_id("r1"))
                    .with_folder(
                        Folder::new("Admin")
                            .with_id("f2")
                            .with_request(ApiRequest::get("Audit", "/audit").with_id("r2")),
                    )
                    .with_request(ApiRequest::get("Get", "/users/1").with_id("r3")),
            )
    }

    #[test]
    fn test_collection_creation() {
        let collection = Collection::new("My API");
        assert_eq!(collection.name, "My API");
        assert!(collection.requests.is_empty());
        assert!(collection.created_at.is_some());
    }

    #[test]
    fn test_request_count() {
        assert_eq!(sample().request_count(), 4);
    }

    #[test]
    fn test_requests_in_order() {
        let collection = sample();
        let ids: Vec<_> = collection
            .requests_in_order()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r0", "r1", "r3", "r2"]);
    }

    #[test]
    fn test_find_nested_folder() {
        let collection = sample();
        let admin = collection.find_folder("f2");
        assert_eq!(admin.map(|f| f.name.as_str()), Some("Admin"));
        assert!(collection.find_folder("missing").is_none());
    }

    #[test]
    fn test_folder_requests_in_order() {
        let collection = sample();
        let users = collection.find_folder("f1");
        let ids: Vec<_> = users
            .map(Folder::requests_in_order)
            .unwrap_or_default()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r1", "r3", "r2"]);
    }
}
