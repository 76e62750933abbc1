//! Variable parser for {{variable}} syntax
//!
//! Parses strings to extract variable references with their positions.

use std::ops::Range;

/// Represents a parsed variable reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The variable name (without {{ }}, surrounding whitespace trimmed).
    pub name: String,

    /// Byte range in the original string where this reference appears.
    pub span: Range<usize>,
}

impl VariableReference {
    /// Creates a new variable reference.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Parses a string and extracts all `{{variable}}` references in order.
///
/// An unterminated `{{` ends the scan; the rest of the input has no references.
///
/// # Examples
///
/// ```
/// use probe_application::variable_resolver::parser::parse_variables;
///
/// let refs = parse_variables("{{base_url}}/users/{{ id }}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "base_url");
/// assert_eq!(refs[1].name, "id");
/// ```
#[must_use]
pub fn parse_variables(input: &str) -> Vec<VariableReference> {
    let mut references = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((open, ch)) = chars.next() {
        if ch != '{' || !matches!(chars.peek(), Some((_, '{'))) {
            continue;
        }
        chars.next();

        let mut start = open;
        let mut name = String::new();
        let mut found_end = false;
        while let Some((idx, ch)) = chars.next() {
            // A fresh `{{` restarts the reference: `{{a {{b}}` yields `b`.
            if ch == '{' && matches!(chars.peek(), Some((_, '{'))) {
                chars.next();
                start = idx;
                name.clear();
                continue;
            }
            if ch == '}' {
                if let Some(&(end_idx, '}')) = chars.peek() {
                    chars.next();
                    let trimmed = name.trim();
                    if !trimmed.is_empty() {
                        references.push(VariableReference::new(trimmed, start..end_idx + 1));
                    }
                    found_end = true;
                    break;
                }
            }
            name.push(ch);
        }

        if !found_end {
            break;
        }
    }

    references
}
