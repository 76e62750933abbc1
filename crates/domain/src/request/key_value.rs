//! Key-value pair type shared by params, headers, form fields and variables.

use serde::{Deserialize, Serialize};

/// A key-value pair that can be switched off without being deleted.
///
/// Disabled pairs stay in storage (and in native exports) but are skipped by
/// variable resolution, wire serialization and every foreign export format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// The key (parameter name, header name, variable name)
    pub key: String,
    /// The value, possibly containing `{{tokens}}`
    #[serde(default)]
    pub value: String,
    /// Whether this pair takes part in downstream use
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl KeyValuePair {
    /// Creates a new enabled pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled pair.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: false,
        }
    }
}

/// Iterates over the enabled pairs of a slice, preserving order.
pub fn enabled(pairs: &[KeyValuePair]) -> impl Iterator<Item = &KeyValuePair> {
    pairs.iter().filter(|p| p.enabled)
}

/// Looks up the value of the last enabled pair named `key` (case-insensitive).
#[must_use]
pub fn find_ignore_case<'a>(pairs: &'a [KeyValuePair], key: &str) -> Option<&'a str> {
    enabled(pairs)
        .filter(|p| p.key.eq_ignore_ascii_case(key))
        .last()
        .map(|p| p.value.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enabled_filter() {
        let pairs = vec![
            KeyValuePair::new("a", "1"),
            KeyValuePair::disabled("b", "2"),
            KeyValuePair::new("c", "3"),
        ];
        let keys: Vec<_> = enabled(&pairs).map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let pair: KeyValuePair = serde_json::from_str(r#"{"key": "k", "value": "v"}"#).unwrap();
        assert!(pair.enabled);
    }

    #[test]
    fn test_find_ignore_case_skips_disabled() {
        let pairs = vec![
            KeyValuePair::new("Content-Type", "text/plain"),
            KeyValuePair::disabled("content-type", "application/xml"),
        ];
        assert_eq!(find_ignore_case(&pairs, "CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(find_ignore_case(&pairs, "accept"), None);
    }
}
