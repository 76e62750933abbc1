//! Lookup scope for variable substitution
//!
//! Flattens globals and the active environment into a single map.

use std::collections::HashMap;

use super::variable::Environment;
use crate::request::{KeyValuePair, enabled};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableScope {
    /// Workspace globals - lowest precedence
    Global = 0,
    /// Active environment - wins over globals
    Environment = 1,
}

/// A single resolved variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// The variable name (without braces).
    pub name: String,
    /// The resolved value.
    pub value: String,
    /// Scope the value came from.
    pub scope: VariableScope,
}

/// Flattened variable scope used for one resolution pass.
///
/// Built from globals first (later duplicates win), then overlaid with the
/// active environment's enabled variables. Disabled pairs never enter the scope.
#[derive(Debug, Clone, Default)]
pub struct ResolutionScope {
    values: HashMap<String, (String, VariableScope)>,
}

impl ResolutionScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the scope from globals and an optional active environment.
    #[must_use]
    pub fn from_sources(globals: &[KeyValuePair], environment: Option<&Environment>) -> Self {
        let mut scope = Self::new();
        scope.overlay(globals, VariableScope::Global);
        if let Some(environment) = environment {
            scope.overlay(&environment.variables, VariableScope::Environment);
        }
        scope
    }

    fn overlay(&mut self, pairs: &[KeyValuePair], origin: VariableScope) {
        for pair in enabled(pairs) {
            self.values
                .insert(pair.key.clone(), (pair.value.clone(), origin));
        }
    }

    /// Resolves a variable name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedVariable> {
        self.values.get(name).map(|(value, scope)| ResolvedVariable {
            name: name.to_string(),
            value: value.clone(),
            scope: *scope,
        })
    }
}
