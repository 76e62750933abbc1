//! Environment types

use serde::{Deserialize, Serialize};

use crate::id::generate_id;
use crate::request::KeyValuePair;

/// A named, switchable bag of variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique identifier
    pub id: String,
    /// Environment name (e.g. "development")
    pub name: String,
    /// Variables; disabled entries are kept but never resolved
    #[serde(default)]
    pub variables: Vec<KeyValuePair>,
}

impl Environment {
    /// Creates a new empty environment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            variables: Vec::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Appends an enabled variable.
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push(KeyValuePair::new(key, value));
        self
    }

    /// Appends a variable as given.
    pub fn add_variable(&mut self, variable: KeyValuePair) {
        self.variables.push(variable);
    }
}

/// Workspace-wide variables, independent of any environment.
pub type GlobalVars = Vec<KeyValuePair>;

/// Finds the active environment; `None` when no id is set or it is unknown.
#[must_use]
pub fn find_active<'a>(
    environments: &'a [Environment],
    active_id: Option<&str>,
) -> Option<&'a Environment> {
    let active_id = active_id?;
    environments.iter().find(|e| e.id == active_id)
}
