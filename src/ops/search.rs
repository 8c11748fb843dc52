use regex::{Regex, RegexBuilder};

use crate::model::blessing::{Blessing, HistoryItem};
use crate::model::category::CategoryFilter;

/// Compile a case-insensitive search pattern. The term is plain text unless
/// `regex` is set.
pub fn search_pattern(term: &str, regex: bool) -> Result<Regex, regex::Error> {
    let source = if regex {
        term.to_string()
    } else {
        regex::escape(term)
    };
    RegexBuilder::new(&source).case_insensitive(true).build()
}

/// Filter for the history and favorites lists
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub pattern: Option<Regex>,
    pub category: CategoryFilter,
}

impl Query {
    /// A substring query. Regex syntax in `term` has no special meaning.
    pub fn new(term: Option<&str>, category: CategoryFilter) -> Result<Self, regex::Error> {
        Self::build(term, category, false)
    }

    pub fn with_regex(term: Option<&str>, category: CategoryFilter) -> Result<Self, regex::Error> {
        Self::build(term, category, true)
    }

    fn build(
        term: Option<&str>,
        category: CategoryFilter,
        regex: bool,
    ) -> Result<Self, regex::Error> {
        let pattern = match term {
            Some(t) if !t.is_empty() => Some(search_pattern(t, regex)?),
            _ => None,
        };
        Ok(Query { pattern, category })
    }

    /// History matches on the wish or the blessing text.
    pub fn matches_history(&self, item: &HistoryItem) -> bool {
        let text_ok = match &self.pattern {
            Some(re) => re.is_match(&item.wish) || re.is_match(&item.blessing.text),
            None => true,
        };
        text_ok && self.category.matches(item.blessing.category)
    }

    /// Favorites match on the blessing text only.
    pub fn matches_favorite(&self, blessing: &Blessing) -> bool {
        let text_ok = match &self.pattern {
            Some(re) => re.is_match(&blessing.text),
            None => true,
        };
        text_ok && self.category.matches(blessing.category)
    }
}

pub fn filter_history<'a>(items: &'a [HistoryItem], query: &Query) -> Vec<&'a HistoryItem> {
    items.iter().filter(|i| query.matches_history(i)).collect()
}

pub fn filter_favorites<'a, I>(favorites: I, query: &Query) -> Vec<&'a Blessing>
where
    I: IntoIterator<Item = &'a Blessing>,
{
    favorites
        .into_iter()
        .filter(|b| query.matches_favorite(b))
        .collect()
}
