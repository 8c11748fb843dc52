use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;

/// A pre-written catalog entry. Never mutated once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blessing {
    /// Stable identifier, unique within a catalog (e.g. `love-2`)
    pub id: String,
    /// The blessing text
    pub text: String,
    /// Optional attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub category: Category,
    /// Short display labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Blessing {
    pub fn new(id: impl Into<String>, text: impl Into<String>, category: Category) -> Self {
        Blessing {
            id: id.into(),
            text: text.into(),
            author: None,
            category,
            tags: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Free-text user input, trimmed and guaranteed non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wish(String);

impl Wish {
    /// Trim the input; whitespace-only input yields `None`.
    pub fn new(text: &str) -> Option<Wish> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Wish(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One logged wish and the blessing it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub wish: String,
    /// Embedded by value so history survives catalog changes
    pub blessing: Blessing,
    pub timestamp: DateTime<Utc>,
}
