use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the six fixed content partitions of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Love,
    Wisdom,
    Health,
    Success,
    Peace,
    Gratitude,
}

impl Category {
    /// All concrete categories, in display order
    pub const ALL: [Category; 6] = [
        Category::Love,
        Category::Wisdom,
        Category::Health,
        Category::Success,
        Category::Peace,
        Category::Gratitude,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Love => "love",
            Category::Wisdom => "wisdom",
            Category::Health => "health",
            Category::Success => "success",
            Category::Peace => "peace",
            Category::Gratitude => "gratitude",
        }
    }

    /// Tab label shown for this category
    pub fn label(self) -> &'static str {
        match self {
            Category::Love => "EMOTION",
            Category::Wisdom => "KNOWLEDGE",
            Category::Health => "WELLNESS",
            Category::Success => "ACHIEVEMENT",
            Category::Peace => "SERENITY",
            Category::Gratitude => "APPRECIATION",
        }
    }

    /// Prompt shown in an empty wish input
    pub fn prompt(self) -> &'static str {
        match self {
            Category::Love => "SPECIFY EMOTIONAL PARAMETERS...",
            Category::Wisdom => "REQUEST KNOWLEDGE TRANSFER...",
            Category::Health => "DEFINE WELLNESS PROTOCOLS...",
            Category::Success => "SET ACHIEVEMENT TARGETS...",
            Category::Peace => "CONFIGURE SERENITY SETTINGS...",
            Category::Gratitude => "INITIALIZE APPRECIATION SEQUENCE...",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected all, love, wisdom, health, success, peace or gratitude)")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// A category query: either the `all` wildcard or one concrete category.
///
/// `all` is never an entry's own category, so it lives here rather than on
/// [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "ALL PROTOCOLS",
            CategoryFilter::Only(c) => c.label(),
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            CategoryFilter::All => "INPUT YOUR NEURAL REQUEST...",
            CategoryFilter::Only(c) => c.prompt(),
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(c: Category) -> Self {
        CategoryFilter::Only(c)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryFilter {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}
