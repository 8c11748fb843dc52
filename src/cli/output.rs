use chrono::NaiveDate;
use serde::Serialize;

use crate::io::store::StoreStats;
use crate::model::blessing::{Blessing, HistoryItem};
use crate::model::catalog::Catalog;
use crate::model::category::{Category, CategoryFilter};
use crate::ops::daily::{Greeting, TimeOfDay};

/// At most this many tags are shown per blessing
const MAX_TAGS_SHOWN: usize = 3;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BlessingJson<'a> {
    #[serde(flatten)]
    pub blessing: &'a Blessing,
    pub favorited: bool,
}

#[derive(Serialize)]
pub struct WishJson<'a> {
    pub id: &'a str,
    pub wish: &'a str,
    pub timestamp: String,
    pub blessing: BlessingJson<'a>,
}

#[derive(Serialize)]
pub struct DailyJson<'a> {
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub greeting: Greeting,
    pub blessing: BlessingJson<'a>,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub id: &'static str,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Serialize)]
pub struct FavToggleJson<'a> {
    pub id: &'a str,
    pub favorited: bool,
    pub favorites: usize,
}

#[derive(Serialize)]
pub struct HistoryJson<'a> {
    pub total: usize,
    pub items: Vec<&'a HistoryItem>,
}

pub fn categories_json(catalog: &Catalog) -> Vec<CategoryJson> {
    let mut out = vec![CategoryJson {
        id: CategoryFilter::All.as_str(),
        label: CategoryFilter::All.label(),
        count: catalog.len(),
    }];
    out.extend(Category::ALL.iter().map(|&c| CategoryJson {
        id: c.as_str(),
        label: c.label(),
        count: catalog.count(c),
    }));
    out
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Render a blessing as a card:
///
/// ```text
/// wisdom-1 [wisdom] *
/// May wisdom guide your steps...
///   - Ancient Proverb
///   #guidance #clarity #growth
/// ```
///
/// The trailing `*` marks a favorite.
pub fn format_blessing(blessing: &Blessing, favorited: bool) -> String {
    let mut out = format!("{} [{}]", blessing.id, blessing.category);
    if favorited {
        out.push_str(" *");
    }
    out.push('\n');
    out.push_str(&blessing.text);
    out.push('\n');
    if let Some(author) = &blessing.author {
        out.push_str(&format!("  - {}\n", author));
    }
    if !blessing.tags.is_empty() {
        let tags: Vec<String> = blessing
            .tags
            .iter()
            .take(MAX_TAGS_SHOWN)
            .map(|t| format!("#{}", t))
            .collect();
        out.push_str(&format!("  {}\n", tags.join(" ")));
    }
    out
}

/// One history line: `2024-03-15 09:00  "calm" -> peace-1 [peace]`
pub fn format_history_line(item: &HistoryItem, favorited: bool) -> String {
    format!(
        "{}  \"{}\" -> {} [{}]{}",
        item.timestamp.format("%Y-%m-%d %H:%M"),
        item.wish,
        item.blessing.id,
        item.blessing.category,
        if favorited { " *" } else { "" }
    )
}

pub fn format_daily(
    date: NaiveDate,
    greeting: Greeting,
    blessing: &Blessing,
    favorited: bool,
) -> String {
    let mut out = String::new();
    out.push_str(greeting.title);
    out.push('\n');
    out.push_str(greeting.message);
    out.push_str("\n\n");
    out.push_str(&date.format("%A, %B %-d, %Y").to_string().to_uppercase());
    out.push('\n');
    out.push_str(&format_blessing(blessing, favorited));
    out
}

pub fn format_categories(catalog: &Catalog) -> String {
    categories_json(catalog)
        .iter()
        .map(|c| format!("{:<10} {:<14} {}\n", c.id, c.label, c.count))
        .collect()
}

pub fn format_stats(stats: StoreStats) -> String {
    format!("history: {}  favorites: {}", stats.history, stats.favorites)
}
