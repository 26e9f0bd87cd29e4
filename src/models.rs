use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A Gmail label as returned by labels.list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// Prompts list labels by name
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Criteria selecting the messages to delete
///
/// Label ids and query are AND-combined by Gmail. A filter with neither set
/// matches every message in the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    label_ids: BTreeSet<String>,
    query: Option<String>,
}

impl SearchFilter {
    /// Filter that explicitly matches every message
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn with_labels<I, S>(mut self, label_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_ids.extend(label_ids.into_iter().map(Into::into));
        self
    }

    /// Set the free-text query; blank queries are treated as absent
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let trimmed = query.trim();
        self.query = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn label_ids(&self) -> impl Iterator<Item = &str> {
        self.label_ids.iter().map(String::as_str)
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn has_labels(&self) -> bool {
        !self.label_ids.is_empty()
    }

    pub fn is_match_all(&self) -> bool {
        self.label_ids.is_empty() && self.query.is_none()
    }
}

/// Reference to a remote message; ids are all deletion needs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One page (or a merged run of pages) of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn new(messages: Vec<MessageRef>, next_page_token: Option<String>) -> Self {
        Self {
            messages,
            next_page_token,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }

    /// Append a following page, carrying its token forward
    pub fn merge(&mut self, next: SearchPage) {
        self.messages.extend(next.messages);
        self.next_page_token = next.next_page_token;
    }

    pub fn message_ids(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.id.clone()).collect()
    }
}

/// A confirmed filter plus the running count for one delete run
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    pub filter: SearchFilter,
    /// Display names of the selected labels, in selection order
    pub label_names: Vec<String>,
    /// Messages deleted by the latest run
    pub deleted: u64,
}

impl DeletionPlan {
    pub fn new(filter: SearchFilter) -> Self {
        Self {
            filter,
            label_names: Vec::new(),
            deleted: 0,
        }
    }

    /// Build a plan from selected labels and an optional query
    pub fn from_selection(labels: &[Label], query: Option<&str>) -> Self {
        let mut filter = SearchFilter::default().with_labels(labels.iter().map(|l| l.id.clone()));
        if let Some(query) = query {
            filter = filter.with_query(query);
        }

        Self {
            filter,
            label_names: labels.iter().map(|l| l.name.clone()).collect(),
            deleted: 0,
        }
    }

    /// Human readable description of what confirming will delete
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            "After confirming, the messages that match all of the following conditions will be deleted."
                .to_string(),
        ];

        if self.filter.has_labels() {
            if self.label_names.is_empty() {
                let ids: Vec<&str> = self.filter.label_ids().collect();
                lines.push(format!("Label IDs: {}", ids.join(", ")));
            } else {
                lines.push(format!("Labels: {}", self.label_names.join(", ")));
            }
        }
        if let Some(query) = self.filter.query() {
            lines.push(format!("Search Query: {}", query));
        }
        if self.filter.is_match_all() {
            lines.push(
                "Warning! No filters are specified; continuing will delete ALL messages in the current account."
                    .to_string(),
            );
        }

        lines
    }
}
