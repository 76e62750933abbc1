//! Variable resolution engine
//!
//! Resolves `{{variable}}` references against a [`ResolutionScope`].

use probe_domain::environment::{ResolutionScope, ResolvedVariable};

use super::parser::parse_variables;

/// Result of variable resolution for a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The resolved string with all known variables substituted.
    pub resolved: String,

    /// Variables that were successfully resolved.
    pub resolved_variables: Vec<ResolvedVariable>,

    /// Variable names that could not be resolved.
    pub unresolved: Vec<String>,
}

impl ResolutionResult {
    /// Creates a result for input with no variables.
    #[must_use]
    pub fn no_variables(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            resolved_variables: Vec::new(),
            unresolved: Vec::new(),
        }
    }
}

/// The variable resolution engine.
///
/// Substitution is single-pass: a substituted value is never scanned again,
/// so a value containing `{{other}}` is emitted as-is. Unknown names are left
/// verbatim, braces included.
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    scope: ResolutionScope,
}

impl VariableResolver {
    /// Creates a new resolver over the given scope.
    #[must_use]
    pub const fn new(scope: ResolutionScope) -> Self {
        Self { scope }
    }

    /// Resolves all variables in the input string.
    #[must_use]
    pub fn resolve(&self, input: &str) -> ResolutionResult {
        let references = parse_variables(input);

        if references.is_empty() {
            return ResolutionResult::no_variables(input);
        }

        let mut resolved_variables = Vec::new();
        let mut unresolved = Vec::new();
        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for var_ref in &references {
            result.push_str(&input[last_end..var_ref.span.start]);

            if let Some(resolved) = self.scope.resolve(&var_ref.name) {
                result.push_str(&resolved.value);
                resolved_variables.push(resolved);
            } else {
                result.push_str(&input[var_ref.span.clone()]);
                unresolved.push(var_ref.name.clone());
            }

            last_end = var_ref.span.end;
        }

        result.push_str(&input[last_end..]);

        ResolutionResult {
            resolved: result,
            resolved_variables,
            unresolved,
        }
    }
}
