//! Hero catalog grid with name search and attribute filter.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::{Loadable, ViewCell, ViewError};
use crate::fetch::StatsSource;
use crate::listing::{CategoryFilter, SortFilterState};
use crate::models::{CombinedRecord, Hero, HeroesResponse};

pub struct HeroGridView {
    source: Arc<dyn StatsSource>,
    filter: SortFilterState,
    cell: ViewCell<HeroesResponse>,
}

impl HeroGridView {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self {
            source,
            filter: SortFilterState::default(),
            cell: ViewCell::new(),
        }
    }

    pub async fn state(&self) -> Loadable<HeroesResponse> {
        self.cell.snapshot().await
    }

    pub async fn load(&self) -> bool {
        self.cell.run(load_catalog(Arc::clone(&self.source))).await
    }

    pub fn spawn_load(&self) -> JoinHandle<bool> {
        let cell = self.cell.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move { cell.run(load_catalog(source)).await })
    }

    pub async fn retry(&self) -> bool {
        self.load().await
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filter.search_text = text.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
    }

    /// Heroes matching the search text and attribute, in catalog order.
    pub async fn visible(&self) -> Option<Vec<Hero>> {
        self.cell
            .with(|state| {
                state.ready().map(|catalog| {
                    catalog
                        .heroes
                        .iter()
                        .filter(|hero| self.filter.matches(&CombinedRecord::from(*hero)))
                        .cloned()
                        .collect()
                })
            })
            .await
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }
}

async fn load_catalog(source: Arc<dyn StatsSource>) -> Result<HeroesResponse, ViewError> {
    let catalog = source.heroes().await?;
    info!("Loaded {} heroes from {}", catalog.heroes.len(), source.name());
    Ok(catalog)
}
