use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::blessing::Blessing;
use crate::model::catalog::Catalog;
use crate::model::category::{Category, CategoryFilter};

/// Selection failed because the catalog cannot satisfy the query.
///
/// This is a configuration problem, not an empty-result UI state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("the blessing catalog is empty")]
    EmptyCatalog,
    #[error("the blessing catalog has no '{0}' entries")]
    EmptyCategory(Category),
}

/// Source of uniformly distributed indices
pub trait RandomSource {
    /// Return a value in `[0, upper)`. `upper` is always at least 1.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// Thread-local OS-seeded randomness
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        rand::rng().random_range(0..upper)
    }
}

/// Reproducible randomness from a fixed seed
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.0.random_range(0..upper)
    }
}

/// Replays a fixed list of values, each reduced modulo `upper`.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<usize>,
    pos: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<usize>) -> Self {
        FixedSequence { values, pos: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn next_index(&mut self, upper: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % upper
    }
}

/// Pick one blessing uniformly at random among those matching `filter`.
pub fn select_random<'a>(
    catalog: &'a Catalog,
    filter: CategoryFilter,
    rng: &mut dyn RandomSource,
) -> Result<&'a Blessing, SelectionError> {
    let candidates = catalog.filtered(filter);
    if candidates.is_empty() {
        return Err(match filter {
            CategoryFilter::All => SelectionError::EmptyCatalog,
            CategoryFilter::Only(c) => SelectionError::EmptyCategory(c),
        });
    }
    let index = rng.next_index(candidates.len());
    let chosen = candidates[index];
    tracing::debug!(filter = %filter, id = %chosen.id, "selected random blessing");
    Ok(chosen)
}

/// `year * 10000 + month * 100 + day`, e.g. 2024-03-15 → 20240315
pub fn daily_seed(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// The blessing for a calendar date: `daily_seed(date) mod len`, over the
/// whole catalog in order. Pure function of the catalog and the date.
pub fn select_daily(catalog: &Catalog, date: NaiveDate) -> Result<&Blessing, SelectionError> {
    if catalog.is_empty() {
        return Err(SelectionError::EmptyCatalog);
    }
    let index = daily_seed(date).rem_euclid(catalog.len() as i64) as usize;
    Ok(&catalog.entries()[index])
}

/// Pick uniformly from the whole catalog, avoiding `exclude` when any other
/// entry exists. Used when the user asks for a different daily blessing.
pub fn select_fresh<'a>(
    catalog: &'a Catalog,
    exclude: Option<&str>,
    rng: &mut dyn RandomSource,
) -> Result<&'a Blessing, SelectionError> {
    if catalog.is_empty() {
        return Err(SelectionError::EmptyCatalog);
    }
    let candidates: Vec<&Blessing> = match exclude {
        Some(id) if catalog.len() > 1 => {
            catalog.entries().iter().filter(|b| b.id != id).collect()
        }
        _ => catalog.entries().iter().collect(),
    };
    Ok(candidates[rng.next_index(candidates.len())])
}
