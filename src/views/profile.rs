//! Player profile header and paged match history.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use super::{Loadable, ViewCell, ViewError};
use crate::fetch::StatsSource;
use crate::listing::{PageMeta, PageState};
use crate::models::{DatasetId, Match, User};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileData {
    pub user: User,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPage {
    pub matches: Vec<Match>,
    pub meta: PageMeta,
}

pub struct ProfileView {
    source: Arc<dyn StatsSource>,
    pages: PageState,
    cell: ViewCell<ProfileData>,
}

impl ProfileView {
    pub fn new(source: Arc<dyn StatsSource>, page_size: usize) -> Self {
        Self {
            source,
            pages: PageState::new(page_size),
            cell: ViewCell::new(),
        }
    }

    pub async fn state(&self) -> Loadable<ProfileData> {
        self.cell.snapshot().await
    }

    pub async fn load(&self) -> bool {
        self.cell.run(load_profile(Arc::clone(&self.source))).await
    }

    pub fn spawn_load(&self) -> JoinHandle<bool> {
        let cell = self.cell.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move { cell.run(load_profile(source)).await })
    }

    pub async fn retry(&self) -> bool {
        self.load().await
    }

    pub async fn go_to_page(&mut self, page: usize) -> bool {
        let Some(ids) = self.match_ids().await else {
            return false;
        };
        self.pages.sync(DatasetId::of_keys("matches", &ids));
        self.pages.set_page(page, ids.len())
    }

    /// Current page of the match history, once loaded.
    pub async fn match_page(&mut self) -> Option<MatchPage> {
        let matches = self
            .cell
            .with(|state| state.ready().map(|data| data.matches.clone()))
            .await?;
        let ids: Vec<u64> = matches.iter().map(|m| m.id).collect();
        self.pages.sync(DatasetId::of_keys("matches", &ids));

        Some(MatchPage {
            matches: self.pages.slice(&matches).to_vec(),
            meta: self.pages.meta(matches.len()),
        })
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }

    async fn match_ids(&self) -> Option<Vec<u64>> {
        self.cell
            .with(|state| {
                state
                    .ready()
                    .map(|data| data.matches.iter().map(|m| m.id).collect())
            })
            .await
    }
}

async fn load_profile(source: Arc<dyn StatsSource>) -> Result<ProfileData, ViewError> {
    let (user, matches) = tokio::try_join!(source.user_profile(), source.matches())?;
    info!(
        "Loaded profile {} ({}) with {} matches",
        user.name,
        user.id_,
        matches.len()
    );
    Ok(ProfileData { user, matches })
}
