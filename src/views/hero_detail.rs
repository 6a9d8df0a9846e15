//! Best matchups, best allies and most successful items for one hero.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{rank_by_win_rate, Loadable, ViewCell, ViewError};
use crate::fetch::{fetch_series, StatsSource};
use crate::models::{HeroId, ItemRecord, MatchupRecord, RatingBracket, StatsType};
use crate::normalize::Normalizer;

/// Rows kept per section.
pub const TOP_N: usize = 5;

const DETAIL_SERIES: [StatsType; 3] = [StatsType::Against, StatsType::With, StatsType::Item];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroDetail {
    pub hero_id: HeroId,
    /// Opponents this hero does best against
    pub against: Vec<MatchupRecord>,
    /// Allies this hero does best with
    pub with: Vec<MatchupRecord>,
    pub items: Vec<ItemRecord>,
}

pub struct HeroDetailView {
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    hero: HeroId,
    rating: RatingBracket,
    cell: ViewCell<HeroDetail>,
}

impl HeroDetailView {
    pub fn new(
        source: Arc<dyn StatsSource>,
        normalizer: Normalizer,
        hero: HeroId,
        rating: RatingBracket,
    ) -> Self {
        Self {
            source,
            normalizer,
            hero,
            rating,
            cell: ViewCell::new(),
        }
    }

    pub fn hero(&self) -> HeroId {
        self.hero
    }

    pub async fn state(&self) -> Loadable<HeroDetail> {
        self.cell.snapshot().await
    }

    pub async fn load(&self) -> bool {
        self.cell
            .run(load_detail(
                Arc::clone(&self.source),
                self.normalizer,
                self.hero,
                self.rating,
            ))
            .await
    }

    pub fn spawn_load(&self) -> JoinHandle<bool> {
        let cell = self.cell.clone();
        let source = Arc::clone(&self.source);
        let (normalizer, hero, rating) = (self.normalizer, self.hero, self.rating);
        tokio::spawn(async move { cell.run(load_detail(source, normalizer, hero, rating)).await })
    }

    pub async fn retry(&self) -> bool {
        self.load().await
    }

    pub async fn set_rating(&mut self, rating: RatingBracket) -> bool {
        if rating == self.rating {
            return false;
        }
        self.rating = rating;
        self.load().await
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }
}

async fn load_detail(
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    hero: HeroId,
    rating: RatingBracket,
) -> Result<HeroDetail, ViewError> {
    let payloads = fetch_series(source, rating, &DETAIL_SERIES).await?;

    let mut detail = HeroDetail {
        hero_id: hero,
        against: Vec::new(),
        with: Vec::new(),
        items: Vec::new(),
    };
    for (stats_type, payload) in payloads {
        match stats_type {
            StatsType::Against | StatsType::With => {
                let rows = top_matchups(normalizer.matchups(payload, stats_type, None)?, hero);
                if stats_type == StatsType::Against {
                    detail.against = rows;
                } else {
                    detail.with = rows;
                }
            }
            StatsType::Item => detail.items = top_items(normalizer.items(payload)?, hero),
            other => debug!("Ignoring unexpected {} series", other),
        }
    }

    info!(
        "Hero {} detail: {} against, {} with, {} items",
        hero,
        detail.against.len(),
        detail.with.len(),
        detail.items.len()
    );
    Ok(detail)
}

/// Rows belonging to `hero`, best win rate first, at most [`TOP_N`].
pub fn top_matchups(rows: Vec<MatchupRecord>, hero: HeroId) -> Vec<MatchupRecord> {
    let mut rows: Vec<MatchupRecord> = rows.into_iter().filter(|r| r.my_hero_id == hero).collect();
    rank_by_win_rate(&mut rows, |r| r.win_rate);
    rows.truncate(TOP_N);
    rows
}

pub fn top_items(rows: Vec<ItemRecord>, hero: HeroId) -> Vec<ItemRecord> {
    let mut rows: Vec<ItemRecord> = rows.into_iter().filter(|r| r.hero_id == hero).collect();
    rank_by_win_rate(&mut rows, |r| r.win_rate);
    rows.truncate(TOP_N);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::InMemorySource;
    use crate::normalize::RateScale;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    const AXE: HeroId = HeroId::new(2);

    fn matchup_payload() -> Value {
        let mut rows: Vec<Value> = (10..18)
            .map(|opponent| {
                json!({"my_hero_id": 2, "hero_id": opponent, "win_rate": opponent as f64 / 100.0})
            })
            .collect();
        rows.push(json!({"my_hero_id": 3, "hero_id": 99, "win_rate": 0.99}));
        rows.push(json!({"my_hero_id": 2, "hero_id": 50}));
        Value::Array(rows)
    }

    fn source() -> Arc<InMemorySource> {
        Arc::new(
            InMemorySource::new()
                .with_series(StatsType::Against, matchup_payload())
                .with_series(
                    StatsType::With,
                    json!([
                        {"my_hero_id": 2, "hero_id": 5, "localized_name": "Crystal Maiden", "win_rate": 0.57},
                        {"my_hero_id": 2, "hero_id": 3, "localized_name": "Bane", "win_rate": 0.61},
                    ]),
                )
                .with_series(
                    StatsType::Item,
                    json!([
                        {"hero_id": 2, "item_id": 116, "item_name": "Black King Bar", "win_rate": 0.58},
                        {"hero_id": 2, "item_id": 63, "item_name": "Power Treads", "win_rate": 0.53},
                        {"hero_id": 14, "item_id": 1, "item_name": "Blink Dagger", "win_rate": 0.9},
                    ]),
                ),
        )
    }

    #[tokio::test]
    async fn test_detail_keeps_top_rows_for_hero() {
        let view = HeroDetailView::new(
            source(),
            Normalizer::new(RateScale::Auto),
            AXE,
            RatingBracket::default(),
        );
        assert!(view.load().await);

        let state = view.state().await;
        let detail = state.ready().unwrap();

        let against: Vec<u32> = detail.against.iter().map(|r| r.hero_id.get()).collect();
        assert_eq!(against, vec![17, 16, 15, 14, 13]);

        let with: Vec<u32> = detail.with.iter().map(|r| r.hero_id.get()).collect();
        assert_eq!(with, vec![3, 5]);

        let items: Vec<String> = detail.items.iter().map(|i| i.label()).collect();
        assert_eq!(items, vec!["Black King Bar", "Power Treads"]);
    }

    #[test]
    fn test_missing_win_rate_ranks_last() {
        let rows = vec![
            MatchupRecord {
                my_hero_id: AXE,
                hero_id: HeroId::new(1),
                localized_name: None,
                win_rate: None,
            },
            MatchupRecord {
                my_hero_id: AXE,
                hero_id: HeroId::new(2),
                localized_name: None,
                win_rate: Some(0.1),
            },
        ];
        let ranked = top_matchups(rows, AXE);
        assert_eq!(ranked[0].hero_id, HeroId::new(2));
        assert_eq!(ranked[1].win_rate, None);
    }

    #[tokio::test]
    async fn test_detail_failure_then_retry() {
        let source = source();
        source.fail_next(1);
        let view = HeroDetailView::new(
            source.clone(),
            Normalizer::default(),
            AXE,
            RatingBracket::default(),
        );

        view.load().await;
        assert!(view.state().await.error().is_some());

        view.retry().await;
        assert!(view.state().await.ready().is_some());
    }
}
