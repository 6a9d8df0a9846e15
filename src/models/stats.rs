//! Normalized and combined statistics models.
//!
//! Rate fields (`win_rate`, `presence`, `usage`) are fractions in [0, 1].
//! Every optional numeric field is `None` when the source omitted it, which
//! is distinct from a real value of zero.

use serde::{Deserialize, Serialize};

use super::{Hero, HeroId, PrimaryAttr};

/// One hero's statistics after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub id: HeroId,

    /// Display name; empty when the payload carried none
    #[serde(default)]
    pub display_name: String,

    /// Relative icon path; empty when the payload carried none
    #[serde(default)]
    pub icon_ref: String,

    pub win_rate: Option<f64>,
    pub presence: Option<f64>,
    pub kda: Option<f64>,
    pub gpm: Option<f64>,
    pub xpm: Option<f64>,

    pub matches_count: Option<u32>,
    pub picks_count: Option<u32>,
    pub bans_count: Option<u32>,
}

impl StatRecord {
    /// A record with only an id and every statistic absent.
    pub fn empty(id: HeroId) -> Self {
        Self {
            id,
            display_name: String::new(),
            icon_ref: String::new(),
            win_rate: None,
            presence: None,
            kda: None,
            gpm: None,
            xpm: None,
            matches_count: None,
            picks_count: None,
            bans_count: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_win_rate(mut self, win_rate: f64) -> Self {
        self.win_rate = Some(win_rate);
        self
    }
}

/// A hero enriched with fields from several independently fetched series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    #[serde(flatten)]
    pub stats: StatRecord,

    /// Category used by the attribute filter
    pub primary_attr: Option<PrimaryAttr>,
}

impl CombinedRecord {
    pub fn id(&self) -> HeroId {
        self.stats.id
    }

    pub fn display_name(&self) -> &str {
        &self.stats.display_name
    }
}

impl From<&Hero> for CombinedRecord {
    fn from(hero: &Hero) -> Self {
        Self {
            stats: StatRecord {
                display_name: hero.display_name().to_string(),
                icon_ref: hero.icon.clone(),
                ..StatRecord::empty(hero.id)
            },
            primary_attr: hero.primary_attr,
        }
    }
}

impl From<StatRecord> for CombinedRecord {
    fn from(stats: StatRecord) -> Self {
        Self {
            stats,
            primary_attr: None,
        }
    }
}

/// Hero-vs-hero (or hero-with-hero) result from the `against`/`with` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupRecord {
    /// The hero whose detail view this row belongs to
    pub my_hero_id: HeroId,

    /// The opposing or allied hero
    pub hero_id: HeroId,

    #[serde(default)]
    pub localized_name: Option<String>,

    pub win_rate: Option<f64>,
}

/// Item usage for a hero from the `item` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub hero_id: HeroId,

    pub item_id: Option<u32>,

    #[serde(default)]
    pub item_name: Option<String>,

    pub win_rate: Option<f64>,

    pub usage: Option<f64>,
}

impl ItemRecord {
    pub fn label(&self) -> String {
        match (&self.item_name, self.item_id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => format!("Item {}", id),
            _ => "Unknown item".to_string(),
        }
    }
}
