//! Player profile and match history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HeroId;

/// A match from the player's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,

    pub win: bool,

    /// Duration in seconds
    #[serde(default)]
    pub duration: u32,

    #[serde(default)]
    pub game_mode: u32,

    pub hero_id: HeroId,

    /// Start time as unix seconds
    #[serde(default)]
    pub time: i64,

    #[serde(default)]
    pub kills: u32,

    #[serde(default)]
    pub deaths: u32,

    #[serde(default)]
    pub assists: u32,
}

impl Match {
    /// (kills + assists) / max(deaths, 1)
    pub fn kda_ratio(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }

    /// Start time, or `None` when the backend sent no timestamp.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if self.time <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Response body of `GET /api/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id_: u64,

    #[serde(default)]
    pub name: String,

    /// Avatar image URL
    #[serde(default)]
    pub avatar: String,

    /// Steam profile URL or id
    #[serde(default)]
    pub steam: String,

    #[serde(default)]
    pub rank: u32,

    #[serde(default)]
    pub matches: Vec<Match>,
}

impl User {
    /// Wins and losses across the embedded match list.
    pub fn record(&self) -> (usize, usize) {
        let wins = self.matches.iter().filter(|m| m.win).count();
        (wins, self.matches.len() - wins)
    }
}
