//! Sortable, filterable, paged hero statistics table.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Loadable, ViewCell, ViewError};
use crate::aggregate::{aggregate, SeriesSet};
use crate::fetch::{fetch_series, StatsSource};
use crate::listing::{
    CategoryFilter, PageMeta, PageState, SortDirection, SortFilterState, SortKey,
};
use crate::models::{CombinedRecord, DatasetId, HeroId, RatingBracket, StatsType};
use crate::normalize::Normalizer;

/// Series joined onto the hero catalog for the table.
const TABLE_SERIES: [StatsType; 3] = [StatsType::Raw, StatsType::Gpm, StatsType::Xpm];

/// The rows currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub rating: RatingBracket,
    pub listing: SortFilterState,
    pub rows: Vec<CombinedRecord>,
    pub meta: PageMeta,
}

pub struct HeroesTableView {
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    rating: RatingBracket,
    listing: SortFilterState,
    pages: PageState,
    cell: ViewCell<Vec<CombinedRecord>>,
}

impl HeroesTableView {
    pub fn new(
        source: Arc<dyn StatsSource>,
        normalizer: Normalizer,
        rating: RatingBracket,
        page_size: usize,
    ) -> Self {
        Self {
            source,
            normalizer,
            rating,
            listing: SortFilterState::default(),
            pages: PageState::new(page_size),
            cell: ViewCell::new(),
        }
    }

    pub fn rating(&self) -> RatingBracket {
        self.rating
    }

    pub fn listing(&self) -> &SortFilterState {
        &self.listing
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page()
    }

    pub async fn state(&self) -> Loadable<Vec<CombinedRecord>> {
        self.cell.snapshot().await
    }

    /// Fetch the catalog and every table series, then join them.
    pub async fn load(&self) -> bool {
        self.cell
            .run(load_table(
                Arc::clone(&self.source),
                self.normalizer,
                self.rating,
            ))
            .await
    }

    /// Start a load in the background. The result is dropped if the view
    /// is unmounted first.
    pub fn spawn_load(&self) -> JoinHandle<bool> {
        let cell = self.cell.clone();
        let source = Arc::clone(&self.source);
        let normalizer = self.normalizer;
        let rating = self.rating;
        tokio::spawn(async move { cell.run(load_table(source, normalizer, rating)).await })
    }

    pub async fn retry(&self) -> bool {
        self.load().await
    }

    /// Switch rating bracket, go back to page 1 and re-fetch.
    pub async fn set_rating(&mut self, rating: RatingBracket) -> bool {
        if rating == self.rating {
            return false;
        }
        info!("Rating changed {} -> {}", self.rating, rating);
        self.rating = rating;
        self.pages.reset();
        self.load().await
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.listing.toggle_sort(key);
        debug!(
            "Sorting by {} {}",
            self.listing.sort_key,
            self.listing.direction.arrow()
        );
    }

    /// Sort by `key` in an explicit direction.
    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.listing.sort_key = key;
        self.listing.direction = direction;
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.listing.search_text = text.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.listing.category = category;
    }

    /// Move to `page` of the current filtered listing. Out-of-range pages
    /// are ignored.
    pub async fn go_to_page(&mut self, page: usize) -> bool {
        let Some(ids) = self.ordered_ids().await else {
            return false;
        };
        let dataset = self.dataset_of(&ids);
        self.pages.sync(dataset);
        self.pages.set_page(page, ids.len())
    }

    /// Current page of the sorted, filtered table, once data is ready.
    pub async fn visible(&mut self) -> Option<TablePage> {
        let records = self.cell.with(|state| state.ready().cloned()).await?;
        let ordered = self.listing.apply(&records);
        let ids: Vec<HeroId> = ordered.iter().map(|r| r.id()).collect();
        let dataset = self.dataset_of(&ids);
        self.pages.sync(dataset);

        let rows: Vec<CombinedRecord> = self
            .pages
            .slice(&ordered)
            .iter()
            .map(|r| (*r).clone())
            .collect();

        Some(TablePage {
            rating: self.rating,
            listing: self.listing.clone(),
            rows,
            meta: self.pages.meta(ordered.len()),
        })
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }

    async fn ordered_ids(&self) -> Option<Vec<HeroId>> {
        self.cell
            .with(|state| {
                state
                    .ready()
                    .map(|records| self.listing.apply(records).iter().map(|r| r.id()).collect())
            })
            .await
    }

    fn dataset_of(&self, ordered: &[HeroId]) -> DatasetId {
        DatasetId::of_keys(&self.rating.to_string(), ordered)
    }
}

async fn load_table(
    source: Arc<dyn StatsSource>,
    normalizer: Normalizer,
    rating: RatingBracket,
) -> Result<Vec<CombinedRecord>, ViewError> {
    let (catalog, payloads) = tokio::try_join!(
        source.heroes(),
        fetch_series(Arc::clone(&source), rating, &TABLE_SERIES),
    )?;

    let mut series = SeriesSet::new();
    for (stats_type, payload) in payloads {
        series.insert(stats_type, normalizer.stat_records(payload, stats_type)?);
    }

    let rows = aggregate(catalog.heroes.iter().map(CombinedRecord::from), &series);
    info!(
        "Loaded {} heroes with {} series (rating {})",
        rows.len(),
        series.len(),
        rating
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::InMemorySource;
    use crate::models::{HeroesResponse, PrimaryAttr};
    use crate::normalize::RateScale;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tokio::sync::Semaphore;

    fn catalog(count: u32) -> HeroesResponse {
        let heroes: Vec<Value> = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("npc_dota_hero_{}", id),
                    "localized_name": format!("Hero {:02}", id),
                    "primary_attr": if id % 2 == 0 { "str" } else { "int" },
                })
            })
            .collect();
        serde_json::from_value(json!({ "heroes": heroes })).unwrap()
    }

    fn axe_and_bane() -> InMemorySource {
        let heroes: HeroesResponse = serde_json::from_value(json!({"heroes": [
            {"id": 2, "name": "npc_dota_hero_axe", "localized_name": "Axe", "primary_attr": "str"},
            {"id": 3, "name": "npc_dota_hero_bane", "localized_name": "Bane", "primary_attr": "int"},
        ]}))
        .unwrap();
        InMemorySource::new()
            .with_heroes(heroes)
            .with_series(
                StatsType::Raw,
                json!([
                    {"hero_id": 2, "win_rate": 0.52, "presence": 0.3, "kda": 2.8},
                    {"hero_id": 3, "win_rate": 0.48, "presence": 0.1, "kda": 3.1},
                ]),
            )
            .with_series(StatsType::Gpm, json!({"2": 480, "3": 390}))
            .with_series(StatsType::Xpm, json!({"2": 610}))
    }

    fn table(source: InMemorySource, page_size: usize) -> (Arc<InMemorySource>, HeroesTableView) {
        let source = Arc::new(source);
        let view = HeroesTableView::new(
            source.clone(),
            Normalizer::new(RateScale::Auto),
            RatingBracket::default(),
            page_size,
        );
        (source, view)
    }

    fn many_heroes(count: u32) -> InMemorySource {
        let raw: Vec<Value> = (1..=count)
            .map(|id| json!({"hero_id": id, "win_rate": 0.40 + id as f64 / 1000.0}))
            .collect();
        InMemorySource::new()
            .with_heroes(catalog(count))
            .with_series(StatsType::Raw, Value::Array(raw))
            .with_series(StatsType::Gpm, json!({}))
            .with_series(StatsType::Xpm, json!({}))
    }

    #[tokio::test]
    async fn test_load_joins_series_onto_catalog() {
        let (source, mut view) = table(axe_and_bane(), 10);
        assert!(view.load().await);
        assert_eq!(source.calls(), 4);

        let page = view.visible().await.unwrap();
        let names: Vec<&str> = page.rows.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["Axe", "Bane"]);

        let axe = &page.rows[0];
        assert_eq!(axe.stats.gpm, Some(480.0));
        assert_eq!(axe.stats.xpm, Some(610.0));
        assert_eq!(axe.primary_attr, Some(PrimaryAttr::Strength));

        let bane = &page.rows[1];
        assert_eq!(bane.stats.xpm, None);
        assert_eq!(page.meta.total_items, 2);
    }

    #[tokio::test]
    async fn test_sort_and_filter() {
        let (_, mut view) = table(axe_and_bane(), 10);
        view.load().await;

        view.toggle_sort(SortKey::Name);
        let names: Vec<String> = view
            .visible()
            .await
            .unwrap()
            .rows
            .iter()
            .map(|r| r.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Bane", "Axe"]);

        view.set_search("AX");
        let page = view.visible().await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].id(), HeroId::new(2));

        view.set_search("");
        view.set_category("int".parse().unwrap());
        let page = view.visible().await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].id(), HeroId::new(3));

        view.set_category(CategoryFilter::Any);
        view.set_sort(SortKey::Gpm, SortDirection::Ascending);
        let gpm: Vec<Option<f64>> = view
            .visible()
            .await
            .unwrap()
            .rows
            .iter()
            .map(|r| r.stats.gpm)
            .collect();
        assert_eq!(gpm, vec![Some(390.0), Some(480.0)]);
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let (source, view) = table(axe_and_bane(), 10);
        source.fail_next(1);

        assert!(view.load().await);
        let state = view.state().await;
        assert!(matches!(state.error(), Some(ViewError::NetworkFailure(_))));

        assert!(view.retry().await);
        assert_eq!(view.state().await.ready().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_malformed_series_fails_view() {
        let source = axe_and_bane().with_series(StatsType::Gpm, json!(42));
        let (_, view) = table(source, 10);
        view.load().await;
        assert!(matches!(
            view.state().await.error(),
            Some(ViewError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_pages_through_twenty_five_heroes() {
        let (_, mut view) = table(many_heroes(25), 10);
        view.load().await;

        let first = view.visible().await.unwrap();
        assert_eq!(first.rows.len(), 10);
        assert_eq!(first.meta.total_pages, 3);

        assert!(view.go_to_page(3).await);
        let last = view.visible().await.unwrap();
        assert_eq!(last.rows.len(), 5);
        assert!(!last.meta.has_next);

        assert!(!view.go_to_page(4).await);
        assert_eq!(view.current_page(), 3);
    }

    #[tokio::test]
    async fn test_page_persists_across_renders() {
        let (_, mut view) = table(many_heroes(25), 10);
        view.load().await;
        view.visible().await;
        view.go_to_page(2).await;

        view.visible().await;
        view.visible().await;
        assert_eq!(view.current_page(), 2);
    }

    #[tokio::test]
    async fn test_rating_change_resets_page() {
        let (source, mut view) = table(many_heroes(25), 10);
        view.load().await;
        view.visible().await;
        assert!(view.go_to_page(3).await);

        let rating = RatingBracket::new(44).unwrap();
        assert!(view.set_rating(rating).await);
        let page = view.visible().await.unwrap();
        assert_eq!(page.meta.page, 1);
        assert_eq!(page.rating, rating);
        assert!(source.requests().contains(&"stats/44/raw".to_string()));
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let (_, mut view) = table(many_heroes(25), 10);
        view.load().await;
        view.visible().await;
        view.go_to_page(2).await;

        view.set_search("hero 1");
        let page = view.visible().await.unwrap();
        assert_eq!(page.meta.page, 1);
    }

    #[tokio::test]
    async fn test_unmount_discards_late_result() {
        let gate = Arc::new(Semaphore::new(0));
        let (_, view) = table(axe_and_bane().with_gate(gate.clone()), 10);

        let handle = view.spawn_load();
        tokio::task::yield_now().await;
        view.unmount();
        gate.add_permits(16);

        assert!(!handle.await.unwrap());
        assert!(view.state().await.ready().is_none());
    }
}
