use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::blessing::Blessing;
use super::category::{Category, CategoryFilter};

/// Error type for building or loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate blessing id '{0}'")]
    DuplicateId(String),
    #[error("blessing '{0}' has empty text")]
    EmptyText(String),
    #[error("could not read catalog {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse catalog {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The immutable, ordered collection of blessings.
///
/// Order matters: the daily blessing is chosen by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Blessing>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and empty text.
    ///
    /// An empty catalog or an empty category is allowed here; selection
    /// reports it when it is actually queried.
    pub fn new(entries: Vec<Blessing>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for b in &entries {
            if b.text.trim().is_empty() {
                return Err(CatalogError::EmptyText(b.id.clone()));
            }
            if !seen.insert(b.id.as_str()) {
                return Err(CatalogError::DuplicateId(b.id.clone()));
            }
        }
        Ok(Catalog { entries })
    }

    /// Load a catalog from a JSON array of blessings.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|e| CatalogError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let entries: Vec<Blessing> =
            serde_json::from_str(&text).map_err(|e| CatalogError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Catalog::new(entries)
    }

    pub fn entries(&self) -> &[Blessing] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Blessing> {
        self.entries.iter().find(|b| b.id == id)
    }

    /// Entries matching the filter, in catalog order
    pub fn filtered(&self, filter: CategoryFilter) -> Vec<&Blessing> {
        self.entries
            .iter()
            .filter(|b| filter.matches(b.category))
            .collect()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries.iter().filter(|b| b.category == category).count()
    }

    /// The curated catalog that ships with the binary.
    pub fn builtin() -> Self {
        use Category::*;

        let entries = vec![
            Blessing::new(
                "love-1",
                "May your heart be filled with love that grows deeper with each passing day, and may you always find warmth in the embrace of those who cherish you.",
                Love,
            )
            .with_tags(&["relationships", "romance", "family"]),
            Blessing::new(
                "love-2",
                "Love flows through you like a river of light. May it illuminate every corner of your life and touch all those around you.",
                Love,
            )
            .with_tags(&["self-love", "compassion"]),
            Blessing::new(
                "love-3",
                "The universe conspires to bring love into your life. Open your heart and let it receive all the affection meant for you.",
                Love,
            )
            .with_tags(&["universe", "openness"]),
            Blessing::new(
                "wisdom-1",
                "May wisdom guide your steps, clarity illuminate your path, and understanding deepen with every experience you encounter.",
                Wisdom,
            )
            .with_author("Ancient Proverb")
            .with_tags(&["guidance", "clarity", "growth"]),
            Blessing::new(
                "wisdom-2",
                "In the quiet moments of reflection, may you find the answers you seek and the courage to trust your inner knowing.",
                Wisdom,
            )
            .with_tags(&["intuition", "courage", "reflection"]),
            Blessing::new(
                "wisdom-3",
                "Like a tree that bends in the storm but never breaks, may you find strength in flexibility and wisdom in adaptation.",
                Wisdom,
            )
            .with_tags(&["resilience", "adaptation", "strength"]),
            Blessing::new(
                "health-1",
                "May your body be a temple of vitality, your mind a sanctuary of peace, and your spirit a beacon of radiant health.",
                Health,
            )
            .with_tags(&["vitality", "mental health", "spiritual health"]),
            Blessing::new(
                "health-2",
                "Healing energy flows through every cell of your being. May you feel renewed, refreshed, and vibrantly alive.",
                Health,
            )
            .with_tags(&["healing", "energy", "renewal"]),
            Blessing::new(
                "health-3",
                "May you walk in wellness, breathe in serenity, and radiate the natural glow of perfect health.",
                Health,
            )
            .with_tags(&["wellness", "serenity", "natural healing"]),
            Blessing::new(
                "success-1",
                "May every door you approach open with grace, and every path you choose lead to fulfillment beyond your wildest dreams.",
                Success,
            )
            .with_tags(&["opportunities", "dreams", "fulfillment"]),
            Blessing::new(
                "success-2",
                "Success flows to you naturally as you align your actions with your highest purpose. May abundance be your constant companion.",
                Success,
            )
            .with_tags(&["abundance", "purpose", "alignment"]),
            Blessing::new(
                "success-3",
                "Like a seed that becomes a mighty tree, may your efforts bloom into magnificent achievements that inspire generations.",
                Success,
            )
            .with_tags(&["growth", "achievement", "inspiration"]),
            Blessing::new(
                "peace-1",
                "May tranquility settle in your heart like morning dew on petals, bringing you serene moments throughout your day.",
                Peace,
            )
            .with_tags(&["tranquility", "serenity", "calm"]),
            Blessing::new(
                "peace-2",
                "In the eye of any storm, may you find your center of perfect peace, unshakeable and eternally calm.",
                Peace,
            )
            .with_tags(&["inner peace", "stability", "calm"]),
            Blessing::new(
                "peace-3",
                "Peace be with you in all your goings and comings, in your work and rest, in your speaking and silence.",
                Peace,
            )
            .with_tags(&["universal peace", "balance", "harmony"]),
            Blessing::new(
                "gratitude-1",
                "May your eyes see the beauty in small moments, your heart feel thankfulness in ordinary days, and your spirit dance with joy.",
                Gratitude,
            )
            .with_tags(&["appreciation", "joy", "mindfulness"]),
            Blessing::new(
                "gratitude-2",
                "Gratitude transforms what you have into abundance. May thankfulness be the lens through which you view your blessed life.",
                Gratitude,
            )
            .with_tags(&["abundance", "transformation", "perspective"]),
            Blessing::new(
                "gratitude-3",
                "For every breath, every sunrise, every gentle touch of kindness - may your heart overflow with grateful recognition.",
                Gratitude,
            )
            .with_tags(&["recognition", "kindness", "appreciation"]),
            Blessing::new(
                "universal-1",
                "May the light within you shine so brightly that it illuminates the path for others and brings hope to dark places.",
                Wisdom,
            )
            .with_tags(&["inner light", "hope", "service"]),
            Blessing::new(
                "universal-2",
                "Like stars that guide travelers through the night, may you always find your way home to joy, love, and purpose.",
                Wisdom,
            )
            .with_tags(&["guidance", "purpose", "journey"]),
            Blessing::new(
                "universal-3",
                "May your journey be blessed with unexpected gifts, meaningful connections, and moments of pure wonder.",
                Gratitude,
            )
            .with_tags(&["journey", "wonder", "connections"]),
        ];

        Catalog { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_is_valid_and_covers_every_category() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 21);
        assert!(Catalog::new(catalog.entries().to_vec()).is_ok());
        for c in Category::ALL {
            assert!(catalog.count(c) >= 1, "no entries for {}", c);
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![
            Blessing::new("a", "one", Category::Love),
            Blessing::new("a", "two", Category::Peace),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn rejects_blank_text() {
        let err = Catalog::new(vec![Blessing::new("a", "  ", Category::Love)]).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyText(_)));
    }

    #[test]
    fn filtered_keeps_catalog_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog
            .filtered(CategoryFilter::Only(Category::Wisdom))
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["wisdom-1", "wisdom-2", "wisdom-3", "universal-1", "universal-2"]
        );
        assert_eq!(catalog.filtered(CategoryFilter::All).len(), 21);
    }

    #[test]
    fn load_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"id":"x-1","text":"Go gently.","category":"peace","tags":["calm"]}]"#,
        )
        .unwrap();

        let catalog = Catalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("x-1").unwrap().tags, vec!["calm"]);
    }

    #[test]
    fn load_from_malformed_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "[{").unwrap();
        assert!(matches!(
            Catalog::from_json_file(&path),
            Err(CatalogError::ParseError { .. })
        ));
    }
}
