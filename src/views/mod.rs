//! Screen view models.
//!
//! Each screen owns its own [`Loadable`] state. Failures are caught here and
//! turned into [`ViewError`] values with a retry path; nothing propagates
//! past the screen that issued the request.
//!
//! Loads go through a [`ViewCell`], which drops a result when the screen has
//! been unmounted or a newer load was started in the meantime.

pub mod hero_detail;
pub mod hero_grid;
pub mod hero_page;
pub mod heroes_table;
pub mod profile;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::fetch::FetchError;
use crate::listing::sort::compare_missing_lowest;
use crate::normalize::NormalizeError;

pub use hero_detail::{HeroDetail, HeroDetailView, TOP_N};
pub use hero_grid::HeroGridView;
pub use hero_page::{HeroPageView, HeroStatsPanel};
pub use heroes_table::{HeroesTableView, TablePage};
pub use profile::{MatchPage, ProfileData, ProfileView};

/// Errors surfaced to a screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ViewError {
    /// Message shown next to the retry action.
    pub fn user_message(&self) -> String {
        match self {
            ViewError::NetworkFailure(detail) => {
                format!("Could not load data ({}). Check the connection and retry.", detail)
            }
            ViewError::MalformedPayload(detail) => {
                format!("The server sent data we could not read ({}).", detail)
            }
            ViewError::NotFound(what) => format!("{} was not found.", what),
        }
    }

    /// Whether re-issuing the same request can help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ViewError::NotFound(_))
    }
}

impl From<FetchError> for ViewError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Json(inner) => ViewError::MalformedPayload(inner.to_string()),
            other => ViewError::NetworkFailure(other.to_string()),
        }
    }
}

impl From<NormalizeError> for ViewError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::MalformedPayload(detail) => ViewError::MalformedPayload(detail),
        }
    }
}

/// Highest win rate first, rows without one last. Ties keep input order.
fn rank_by_win_rate<T>(rows: &mut [T], win_rate: impl Fn(&T) -> Option<f64>) {
    rows.sort_by(|a, b| compare_missing_lowest(win_rate(b), win_rate(a)));
}

/// Load state of one piece of screen data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(ViewError),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            Loadable::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Identifies one load; only the most recent ticket may settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Shared, teardown-aware holder of a screen's [`Loadable`] state.
pub struct ViewCell<T> {
    state: Arc<RwLock<Loadable<T>>>,
    mounted: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl<T> Clone for ViewCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            mounted: Arc::clone(&self.mounted),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T> Default for ViewCell<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(Loadable::Idle)),
            mounted: Arc::new(AtomicBool::new(true)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> ViewCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Tear the screen down. In-flight loads will be discarded.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Start a load: mark the state as loading and hand out a fresh ticket.
    /// Returns `None` once the screen is unmounted.
    pub async fn begin(&self) -> Option<Ticket> {
        if !self.is_mounted() {
            return None;
        }
        let ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let mut state = self.state.write().await;
        if !self.is_mounted() {
            return None;
        }
        *state = Loadable::Loading;
        Some(ticket)
    }

    /// Apply a load's outcome if the ticket is still current and the screen
    /// is still mounted. Returns whether the state was updated.
    ///
    /// Both conditions are checked while holding the write lock, so an
    /// unmount that lands while waiting for the lock still wins.
    pub async fn settle(&self, ticket: Ticket, result: Result<T, ViewError>) -> bool {
        let mut state = self.state.write().await;
        if !self.is_mounted() {
            debug!("Discarding result of load {:?}: view unmounted", ticket);
            return false;
        }
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            debug!("Discarding result of superseded load {:?}", ticket);
            return false;
        }

        *state = match result {
            Ok(value) => Loadable::Ready(value),
            Err(e) => {
                warn!("Load failed: {}", e);
                Loadable::Failed(e)
            }
        };
        true
    }

    /// Run `load` under a fresh ticket and settle its result.
    pub async fn run<F>(&self, load: F) -> bool
    where
        F: Future<Output = Result<T, ViewError>>,
    {
        let Some(ticket) = self.begin().await else {
            return false;
        };
        let result = load.await;
        self.settle(ticket, result).await
    }

    /// Inspect the current state without cloning it.
    pub async fn with<R>(&self, f: impl FnOnce(&Loadable<T>) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }
}

impl<T: Clone> ViewCell<T> {
    pub async fn snapshot(&self) -> Loadable<T> {
        self.state.read().await.clone()
    }
}
