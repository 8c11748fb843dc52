//! Per-session controller: the store, the catalog, the random source and the
//! current view state, plus the delayed wish submission.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;

use crate::io::backend::Backend;
use crate::io::store::{Store, StoreStats, StoreWarning};
use crate::model::blessing::{Blessing, HistoryItem, Wish};
use crate::model::catalog::Catalog;
use crate::model::category::CategoryFilter;
use crate::ops::select::{self, RandomSource, SelectionError, ThreadRandom};

/// Default artificial delay before a wish is answered
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a wish is already being processed")]
    SubmissionInFlight,
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Main,
    History,
    Daily,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Main => write!(f, "main"),
            View::History => write!(f, "history"),
            View::Daily => write!(f, "daily"),
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(View::Main),
            "history" => Ok(View::History),
            "daily" => Ok(View::Daily),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag when the submission finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session<B: Backend> {
    catalog: Catalog,
    store: Mutex<Store<B>>,
    rng: Mutex<Box<dyn RandomSource + Send>>,
    category: Mutex<CategoryFilter>,
    view: Mutex<View>,
    current: Mutex<Option<Blessing>>,
    in_flight: AtomicBool,
    delay: Duration,
}

impl<B: Backend> Session<B> {
    pub fn new(catalog: Catalog, store: Store<B>) -> Self {
        Session {
            catalog,
            store: Mutex::new(store),
            rng: Mutex::new(Box::new(ThreadRandom)),
            category: Mutex::new(CategoryFilter::All),
            view: Mutex::new(View::Main),
            current: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_rng(mut self, rng: Box<dyn RandomSource + Send>) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // -- view state ---------------------------------------------------------

    pub fn category(&self) -> CategoryFilter {
        *lock(&self.category)
    }

    pub fn set_category(&self, category: CategoryFilter) {
        *lock(&self.category) = category;
    }

    pub fn view(&self) -> View {
        *lock(&self.view)
    }

    pub fn set_view(&self, view: View) {
        *lock(&self.view) = view;
    }

    /// The blessing answering the most recent wish
    pub fn current(&self) -> Option<Blessing> {
        lock(&self.current).clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // -- wishes -------------------------------------------------------------

    /// Answer a wish after the processing delay and log it.
    ///
    /// Blank input is ignored (`Ok(None)`). Only one submission may be
    /// pending; a second one fails with [`SessionError::SubmissionInFlight`].
    /// Nothing is locked while waiting, so other calls stay responsive.
    pub async fn submit_wish(
        &self,
        text: &str,
        category: CategoryFilter,
    ) -> Result<Option<HistoryItem>, SessionError> {
        let Some(wish) = Wish::new(text) else {
            return Ok(None);
        };
        let _in_flight =
            InFlight::acquire(&self.in_flight).ok_or(SessionError::SubmissionInFlight)?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let blessing = {
            let mut rng = lock(&self.rng);
            select::select_random(&self.catalog, category, &mut **rng)?.clone()
        };
        let item = lock(&self.store).record_wish(&wish, &blessing);
        *lock(&self.current) = Some(blessing);
        Ok(Some(item))
    }

    /// A random blessing that is not logged to history.
    pub fn random(&self, category: CategoryFilter) -> Result<Blessing, SelectionError> {
        let mut rng = lock(&self.rng);
        select::select_random(&self.catalog, category, &mut **rng).cloned()
    }

    // -- favorites ----------------------------------------------------------

    pub fn toggle_favorite(&self, blessing: &Blessing) -> bool {
        lock(&self.store).toggle_favorite(blessing)
    }

    pub fn is_favorited(&self, blessing: &Blessing) -> bool {
        lock(&self.store).is_favorited(blessing)
    }

    /// Look a blessing up by id in the catalog, then in history and
    /// favorites (entries from an older catalog).
    pub fn find_blessing(&self, id: &str) -> Option<Blessing> {
        if let Some(b) = self.catalog.get(id) {
            return Some(b.clone());
        }
        let store = lock(&self.store);
        store
            .history()
            .iter()
            .map(|h| &h.blessing)
            .chain(store.favorites())
            .find(|b| b.id == id)
            .cloned()
    }

    // -- daily --------------------------------------------------------------

    pub fn daily(&self, date: NaiveDate) -> Result<Blessing, SelectionError> {
        lock(&self.store).get_or_create_daily(date, &self.catalog)
    }

    pub fn regenerate_daily(&self, date: NaiveDate) -> Result<Blessing, SelectionError> {
        let mut rng = lock(&self.rng);
        lock(&self.store).regenerate_daily(date, &self.catalog, &mut **rng)
    }

    // -- store access -------------------------------------------------------

    pub fn history(&self) -> Vec<HistoryItem> {
        lock(&self.store).history().to_vec()
    }

    pub fn favorites(&self) -> Vec<Blessing> {
        lock(&self.store).favorites().cloned().collect()
    }

    pub fn stats(&self) -> StoreStats {
        lock(&self.store).stats()
    }

    pub fn reset(&self) {
        lock(&self.store).reset();
        *lock(&self.current) = None;
    }

    pub fn take_warnings(&self) -> Vec<StoreWarning> {
        lock(&self.store).take_warnings()
    }

    /// End the session, handing back the store.
    pub fn into_store(self) -> Store<B> {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::backend::MemoryBackend;
    use crate::io::store::HISTORY_LIMIT;
    use crate::model::category::Category;
    use crate::ops::select::FixedSequence;
    use pretty_assertions::assert_eq;

    fn session() -> Session<MemoryBackend> {
        Session::new(Catalog::builtin(), Store::load(MemoryBackend::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn submit_records_history() {
        let s = session();
        let item = s
            .submit_wish("  peace please  ", Category::Peace.into())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(item.wish, "peace please");
        assert_eq!(item.blessing.category, Category::Peace);
        assert_eq!(s.history()[0], item);
        assert_eq!(s.current(), Some(item.blessing));
        assert!(!s.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_wish_is_a_no_op() {
        let s = session();
        assert!(s.submit_wish("   ", CategoryFilter::All).await.unwrap().is_none());
        assert!(s.history().is_empty());
        assert!(s.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_submission_is_rejected_while_pending() {
        let s = session();
        let (first, second) = tokio::join!(
            s.submit_wish("first", CategoryFilter::All),
            s.submit_wish("second", CategoryFilter::All),
        );
        assert!(first.unwrap().is_some());
        assert!(matches!(second, Err(SessionError::SubmissionInFlight)));
        assert_eq!(s.history().len(), 1);

        // The flag is cleared afterwards
        assert!(s.submit_wish("third", CategoryFilter::All).await.unwrap().is_some());
        assert_eq!(s.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn category_switch_stays_responsive_during_delay() {
        let s = session();
        let switch = async {
            assert!(s.is_submitting());
            s.set_category(Category::Health.into());
            s.set_view(View::History);
        };
        let (submitted, ()) = tokio::join!(s.submit_wish("rest", Category::Love.into()), switch);

        // The submission keeps the category it was issued with
        assert_eq!(submitted.unwrap().unwrap().blessing.category, Category::Love);
        assert_eq!(s.category(), CategoryFilter::Only(Category::Health));
        assert_eq!(s.view(), View::History);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_configured_delay() {
        let s = session().with_delay(Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        s.submit_wish("patience", CategoryFilter::All).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn full_history_evicts_oldest() {
        let s = session().with_delay(Duration::ZERO);
        for i in 0..HISTORY_LIMIT {
            s.submit_wish(&format!("wish {}", i), CategoryFilter::All)
                .await
                .unwrap();
        }
        assert_eq!(s.history().len(), 50);
        let oldest = s.history()[49].clone();

        s.submit_wish("peace please", Category::Peace.into())
            .await
            .unwrap();
        let history = s.history();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].wish, "peace please");
        assert!(history.iter().all(|h| h.id != oldest.id));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_error_clears_in_flight() {
        let catalog =
            Catalog::new(vec![Blessing::new("peace-1", "Be still.", Category::Peace)]).unwrap();
        let s = Session::new(catalog, Store::load(MemoryBackend::new()));
        let err = s
            .submit_wish("health", Category::Health.into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Selection(SelectionError::EmptyCategory(Category::Health))
        ));
        assert!(!s.is_submitting());
        assert!(s.history().is_empty());
    }

    #[test]
    fn fixed_rng_drives_selection() {
        let s = session().with_rng(Box::new(FixedSequence::new(vec![1])));
        assert_eq!(s.random(Category::Love.into()).unwrap().id, "love-2");
    }

    #[test]
    fn find_blessing_falls_back_to_favorites() {
        let s = session();
        let retired = Blessing::new("retired-1", "An old favorite.", Category::Peace);
        s.toggle_favorite(&retired);
        assert_eq!(s.find_blessing("retired-1"), Some(retired.clone()));
        assert_eq!(s.find_blessing("love-1").unwrap().category, Category::Love);
        assert!(s.find_blessing("nope").is_none());
        assert!(s.is_favorited(&retired));
    }

    #[test]
    fn regenerate_then_daily_returns_override() {
        let s = session();
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(s.daily(d).unwrap().id, "success-3");
        let fresh = s.regenerate_daily(d).unwrap();
        assert_eq!(s.daily(d).unwrap(), fresh);
    }

    #[test]
    fn view_parse() {
        assert_eq!("daily".parse::<View>().unwrap(), View::Daily);
        assert!("settings".parse::<View>().is_err());
    }
}
