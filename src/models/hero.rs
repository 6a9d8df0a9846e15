//! Hero catalog models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::HeroId;

/// A hero's primary attribute, used as the grid/table category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryAttr {
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "agi")]
    Agility,
    #[serde(rename = "int")]
    Intelligence,
    #[serde(rename = "all")]
    Universal,
}

impl PrimaryAttr {
    pub fn code(self) -> &'static str {
        match self {
            PrimaryAttr::Strength => "str",
            PrimaryAttr::Agility => "agi",
            PrimaryAttr::Intelligence => "int",
            PrimaryAttr::Universal => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrimaryAttr::Strength => "Strength",
            PrimaryAttr::Agility => "Agility",
            PrimaryAttr::Intelligence => "Intelligence",
            PrimaryAttr::Universal => "Universal",
        }
    }
}

impl fmt::Display for PrimaryAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PrimaryAttr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(PrimaryAttr::Strength),
            "agi" | "agility" => Ok(PrimaryAttr::Agility),
            "int" | "intelligence" => Ok(PrimaryAttr::Intelligence),
            "all" | "uni" | "universal" => Ok(PrimaryAttr::Universal),
            other => Err(format!("unknown attribute '{}'", other)),
        }
    }
}

/// Static hero attributes from the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,

    /// Internal name, e.g. `npc_dota_hero_axe`
    #[serde(default)]
    pub name: String,

    /// Display name, e.g. `Axe`
    #[serde(default)]
    pub localized_name: Option<String>,

    /// Unrecognised attribute codes deserialize as `None`
    #[serde(default, deserialize_with = "lenient_attr")]
    pub primary_attr: Option<PrimaryAttr>,

    #[serde(default)]
    pub attack_type: String,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Relative CDN path of the portrait
    #[serde(default)]
    pub img: String,

    /// Relative CDN path of the minimap icon
    #[serde(default)]
    pub icon: String,

    #[serde(flatten)]
    pub base: BaseStats,
}

/// Base stats block of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub base_health: f64,
    pub base_health_regen: f64,
    pub base_mana: f64,
    pub base_mana_regen: f64,
    pub base_armor: f64,
    pub base_mr: f64,
    pub base_attack_min: f64,
    pub base_attack_max: f64,
    pub base_str: f64,
    pub base_agi: f64,
    pub base_int: f64,
    pub str_gain: f64,
    pub agi_gain: f64,
    pub int_gain: f64,
    pub attack_range: f64,
    pub projectile_speed: f64,
    pub attack_rate: f64,
    pub base_attack_time: f64,
    pub attack_point: f64,
}

fn lenient_attr<'de, D>(deserializer: D) -> Result<Option<PrimaryAttr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

impl Hero {
    /// Name shown to users, falling back to the internal name.
    pub fn display_name(&self) -> &str {
        match self.localized_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self
                .name
                .strip_prefix("npc_dota_hero_")
                .unwrap_or(&self.name),
        }
    }

    pub fn is_melee(&self) -> bool {
        self.attack_type.eq_ignore_ascii_case("melee")
    }
}

/// Response body of `GET /api/heroes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroesResponse {
    pub heroes: Vec<Hero>,
}

impl HeroesResponse {
    /// Look up a hero by id.
    pub fn find(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.iter().find(|h| h.id == id)
    }
}
