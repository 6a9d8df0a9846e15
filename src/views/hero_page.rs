//! Single hero page: the hero resolved from a route id plus a stats panel.
//!
//! The hero and its stats panel load independently. Switching the panel's
//! series or rating bracket re-fetches only the panel.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{rank_by_win_rate, Loadable, ViewCell, ViewError};
use crate::fetch::StatsSource;
use crate::models::{Hero, HeroId, ItemRecord, MatchupRecord, RatingBracket, StatRecord, StatsType};
use crate::normalize::Normalizer;

/// Content of the stats panel for the selected series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "lowercase")]
pub enum HeroStatsPanel {
    /// `raw`, `gpm` or `xpm`; `None` when the backend had no record
    Overview(Option<StatRecord>),
    /// `with` or `against`, best win rate first
    Matchups(Vec<MatchupRecord>),
    Items(Vec<ItemRecord>),
}

pub struct HeroPageView {
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    route: String,
    rating: RatingBracket,
    stats_type: StatsType,
    hero: ViewCell<Hero>,
    panel: ViewCell<HeroStatsPanel>,
}

impl HeroPageView {
    pub fn new(
        source: Arc<dyn StatsSource>,
        normalizer: Normalizer,
        route: impl Into<String>,
        rating: RatingBracket,
    ) -> Self {
        Self {
            source,
            normalizer,
            route: route.into(),
            rating,
            stats_type: StatsType::Raw,
            hero: ViewCell::new(),
            panel: ViewCell::new(),
        }
    }

    /// Series the panel shows on first load.
    pub fn with_stats_type(mut self, stats_type: StatsType) -> Self {
        self.stats_type = stats_type;
        self
    }

    pub fn rating(&self) -> RatingBracket {
        self.rating
    }

    pub fn stats_type(&self) -> StatsType {
        self.stats_type
    }

    pub async fn hero_state(&self) -> Loadable<Hero> {
        self.hero.snapshot().await
    }

    pub async fn panel_state(&self) -> Loadable<HeroStatsPanel> {
        self.panel.snapshot().await
    }

    /// Resolve the hero, then load the panel if it was found.
    pub async fn load(&self) -> bool {
        let resolved = self
            .hero
            .run(resolve_hero(Arc::clone(&self.source), self.route.clone()))
            .await;
        resolved && self.load_panel().await
    }

    pub fn spawn_load(&self) -> JoinHandle<bool> {
        let hero = self.hero.clone();
        let panel = self.panel.clone();
        let source = Arc::clone(&self.source);
        let route = self.route.clone();
        let (normalizer, rating, stats_type) = (self.normalizer, self.rating, self.stats_type);
        tokio::spawn(async move {
            if !hero.run(resolve_hero(Arc::clone(&source), route)).await {
                return false;
            }
            let Some(id) = hero.with(|state| state.ready().map(|h| h.id)).await else {
                return false;
            };
            panel
                .run(fetch_panel(source, normalizer, id, rating, stats_type))
                .await
        })
    }

    /// Re-fetch the panel for the already resolved hero.
    pub async fn load_panel(&self) -> bool {
        let Some(id) = self.hero.with(|state| state.ready().map(|h| h.id)).await else {
            debug!("Panel load skipped: hero not resolved");
            return false;
        };
        self.panel
            .run(fetch_panel(
                Arc::clone(&self.source),
                self.normalizer,
                id,
                self.rating,
                self.stats_type,
            ))
            .await
    }

    /// Retry whichever part failed.
    pub async fn retry(&self) -> bool {
        let hero_loaded = self.hero.with(|state| state.ready().is_some()).await;
        if hero_loaded {
            self.load_panel().await
        } else {
            self.load().await
        }
    }

    pub async fn set_stats_type(&mut self, stats_type: StatsType) -> bool {
        if stats_type == self.stats_type {
            return false;
        }
        self.stats_type = stats_type;
        self.load_panel().await
    }

    pub async fn set_rating(&mut self, rating: RatingBracket) -> bool {
        if rating == self.rating {
            return false;
        }
        self.rating = rating;
        self.load_panel().await
    }

    pub fn unmount(&self) {
        self.hero.unmount();
        self.panel.unmount();
    }
}

async fn resolve_hero(source: Arc<dyn StatsSource>, route: String) -> Result<Hero, ViewError> {
    let not_found = || ViewError::NotFound(format!("Hero '{}'", route.trim()));

    let id: HeroId = route.parse().map_err(|_| not_found())?;
    let catalog = source.heroes().await?;
    let hero = catalog.find(id).cloned().ok_or_else(not_found)?;
    info!("Resolved hero {} ({})", hero.display_name(), hero.id);
    Ok(hero)
}

async fn fetch_panel(
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    hero: HeroId,
    rating: RatingBracket,
    stats_type: StatsType,
) -> Result<HeroStatsPanel, ViewError> {
    let payload = source.hero_stats(rating, hero, stats_type).await?;

    let panel = match stats_type {
        StatsType::Raw | StatsType::Gpm | StatsType::Xpm => {
            HeroStatsPanel::Overview(normalizer.hero_record(payload, stats_type, hero)?)
        }
        StatsType::Against | StatsType::With => {
            let mut rows: Vec<MatchupRecord> = normalizer
                .matchups(payload, stats_type, Some(hero))?
                .into_iter()
                .filter(|r| r.my_hero_id == hero)
                .collect();
            rank_by_win_rate(&mut rows, |r| r.win_rate);
            HeroStatsPanel::Matchups(rows)
        }
        StatsType::Item => {
            let mut rows: Vec<ItemRecord> = normalizer
                .items(payload)?
                .into_iter()
                .filter(|r| r.hero_id == hero)
                .collect();
            rank_by_win_rate(&mut rows, |r| r.win_rate);
            HeroStatsPanel::Items(rows)
        }
    };
    Ok(panel)
}
