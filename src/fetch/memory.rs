//! Fixture-backed [`StatsSource`] for tests and offline runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::{FetchError, StatsSource};
use crate::models::{HeroId, HeroesResponse, Match, RatingBracket, StatsType, User};

/// Serves canned responses. Anything not configured answers HTTP 404.
#[derive(Default)]
pub struct InMemorySource {
    profile: Option<User>,
    matches: Option<Vec<Match>>,
    heroes: Option<HeroesResponse>,
    series: HashMap<StatsType, Value>,
    hero_series: HashMap<(HeroId, StatsType), Value>,
    failures: AtomicU32,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

/// On-disk fixture layout accepted by [`InMemorySource::from_file`].
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    profile: Option<User>,
    #[serde(default)]
    matches: Option<Vec<Match>>,
    #[serde(default)]
    heroes: Option<HeroesResponse>,
    #[serde(default)]
    stats: HashMap<StatsType, Value>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON fixture with optional `profile`, `matches`, `heroes`
    /// and `stats` (keyed by stats type) sections.
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| FetchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let fixture: Fixture = serde_json::from_str(&text)?;
        Ok(Self {
            profile: fixture.profile,
            matches: fixture.matches,
            heroes: fixture.heroes,
            series: fixture.stats,
            ..Self::default()
        })
    }

    pub fn with_profile(mut self, user: User) -> Self {
        self.profile = Some(user);
        self
    }

    pub fn with_matches(mut self, matches: Vec<Match>) -> Self {
        self.matches = Some(matches);
        self
    }

    pub fn with_heroes(mut self, heroes: HeroesResponse) -> Self {
        self.heroes = Some(heroes);
        self
    }

    pub fn with_series(mut self, stats_type: StatsType, payload: Value) -> Self {
        self.series.insert(stats_type, payload);
        self
    }

    pub fn with_hero_series(mut self, hero: HeroId, stats_type: StatsType, payload: Value) -> Self {
        self.hero_series.insert((hero, stats_type), payload);
        self
    }

    /// Every request waits for a permit from `gate` before answering.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Answer the next `n` requests with HTTP 500.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Number of requests served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Request log, e.g. `stats/43/raw`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    async fn enter(&self, request: String) -> Result<(), FetchError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| FetchError::Task(e.to_string()))?;
            permit.forget();
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::HttpStatus {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found() -> FetchError {
    FetchError::HttpStatus {
        status: 404,
        message: "Not Found".to_string(),
    }
}

#[async_trait]
impl StatsSource for InMemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn user_profile(&self) -> Result<User, FetchError> {
        self.enter("me".to_string()).await?;
        self.profile.clone().ok_or_else(not_found)
    }

    async fn matches(&self) -> Result<Vec<Match>, FetchError> {
        self.enter("me/matches".to_string()).await?;
        match &self.matches {
            Some(matches) => Ok(matches.clone()),
            None => self
                .profile
                .as_ref()
                .map(|p| p.matches.clone())
                .ok_or_else(not_found),
        }
    }

    async fn heroes(&self) -> Result<HeroesResponse, FetchError> {
        self.enter("heroes".to_string()).await?;
        self.heroes.clone().ok_or_else(not_found)
    }

    async fn hero_stats(
        &self,
        rating: RatingBracket,
        hero: HeroId,
        stats_type: StatsType,
    ) -> Result<Value, FetchError> {
        self.enter(format!("stats/{}/{}/{}", hero, rating, stats_type))
            .await?;
        self.hero_series
            .get(&(hero, stats_type))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn all_stats(
        &self,
        rating: RatingBracket,
        stats_type: StatsType,
    ) -> Result<Value, FetchError> {
        self.enter(format!("stats/{}/{}", rating, stats_type)).await?;
        self.series.get(&stats_type).cloned().ok_or_else(not_found)
    }
}
