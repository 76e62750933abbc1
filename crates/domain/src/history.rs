//! Request history.
//!
//! Executed requests with their responses, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_id;
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A single entry in the request history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// The request as it was sent (variables resolved).
    pub request: ApiRequest,
    /// Response, absent when the transport failed.
    #[serde(default)]
    pub response: Option<ApiResponse>,
    /// When the request was executed.
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates a new history entry.
    #[must_use]
    pub fn new(request: ApiRequest, response: Option<ApiResponse>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            request,
            response,
            timestamp,
        }
    }
}

/// Request history with a maximum size limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl RequestHistory {
    /// Creates a new empty history.
    #[must_use]
    pub const fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Rebuilds a history from stored entries (newest first), applying the cap.
    #[must_use]
    pub fn from_entries(entries: Vec<HistoryEntry>, max_entries: usize) -> Self {
        let mut history = Self {
            entries: entries.into(),
            max_entries,
        };
        history.trim();
        history
    }

    /// Adds an entry to the history (at the front).
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.trim();
    }

    fn trim(&mut self) {
        self.entries.truncate(self.max_entries);
    }

    /// Returns all entries (newest first).
    #[must_use]
    pub const fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    /// Consumes the history into a newest-first list.
    #[must_use]
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries.into()
    }

    /// Returns an entry by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Clears all history entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(n: usize) -> HistoryEntry {
        let request = ApiRequest::get(format!("req {n}"), format!("https://api.test/{n}"));
        HistoryEntry::new(request, None, Utc::now())
    }

    #[test]
    fn test_newest_first() {
        let mut history = RequestHistory::default();
        history.add(entry(1));
        history.add(entry(2));
        assert_eq!(history.entries()[0].request.name, "req 2");
        assert_eq!(history.entries()[1].request.name, "req 1");
    }

    #[test]
    fn test_retention_cap() {
        let mut history = RequestHistory::default();
        for n in 0..60 {
            history.add(entry(n));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history.entries()[0].request.name, "req 59");
        assert_eq!(history.entries()[49].request.name, "req 10");
    }

    #[test]
    fn test_from_entries_trims_oldest() {
        let entries: Vec<_> = (0..5).map(entry).collect();
        let history = RequestHistory::from_entries(entries, 3);
        let names: Vec<_> = history.entries().iter().map(|e| e.request.name.as_str()).collect();
        assert_eq!(names, vec!["req 0", "req 1", "req 2"]);
    }
}
