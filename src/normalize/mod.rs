//! Stat record normalization.
//!
//! The stats endpoints answer in several shapes depending on the series
//! requested. Each response is first classified into one [`Payload`]
//! variant, then every entry is read through the same field-fallback rules
//! into a [`StatRecord`], [`MatchupRecord`] or [`ItemRecord`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{HeroId, ItemRecord, MatchupRecord, StatRecord, StatsType};

/// Keys under which a wrapper object may nest its record array.
const WRAPPER_KEYS: [&str; 3] = ["data", "stats", "heroes"];

/// Keys under which a single record may nest its statistic fields.
const NESTED_KEYS: [&str; 2] = ["raw", "data"];

/// Field names read as rates, each with its fallbacks.
const RATE_FIELDS: [&[&str]; 3] = [
    &["win_rate", "win_percent"],
    &["presence", "pick_rate"],
    &["usage"],
];

/// A JSON string may itself contain JSON; unwrap at most this many layers.
const MAX_STRING_DEPTH: usize = 2;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// How rate fields in the payload are scaled.
///
/// Rates are stored internally as fractions in [0, 1]. `Auto` is settled
/// once per series with [`RateScale::resolve`], so every rate of a series
/// is read on the same scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateScale {
    /// A series with any rate above 1 is in percent, otherwise fractions
    #[default]
    Auto,
    Fraction,
    Percent,
}

impl RateScale {
    /// Pick the scale for one series from all of its rate values.
    pub fn resolve<I>(self, rates: I) -> RateScale
    where
        I: IntoIterator<Item = f64>,
    {
        match self {
            RateScale::Auto => {
                if rates.into_iter().any(|v| v > 1.0) {
                    RateScale::Percent
                } else {
                    RateScale::Fraction
                }
            }
            fixed => fixed,
        }
    }

    /// Convert a single value; an unresolved `Auto` judges the value alone.
    pub fn to_fraction(self, value: f64) -> f64 {
        match self {
            RateScale::Auto if value > 1.0 => value / 100.0,
            RateScale::Auto | RateScale::Fraction => value,
            RateScale::Percent => value / 100.0,
        }
    }
}

/// The response shapes the stats endpoints are known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `[{...}, {...}]`
    Records(Vec<Value>),

    /// `{"data": [{...}, ...]}`
    Wrapped(Vec<Value>),

    /// `{"1": {...}, "2": 0.52}`, keys are hero ids
    Keyed(BTreeMap<u32, Value>),

    /// A single record, as returned by the per-hero endpoint
    Single(Map<String, Value>),
}

impl Payload {
    /// Classify a decoded response body.
    pub fn classify(value: Value) -> Result<Self, NormalizeError> {
        let value = unwrap_json_string(value, MAX_STRING_DEPTH)?;
        match value {
            Value::Null => Ok(Payload::Records(Vec::new())),
            Value::Array(items) => Ok(Payload::Records(items)),
            Value::Object(map) => Self::classify_object(map),
            other => Err(NormalizeError::MalformedPayload(format!(
                "expected array or object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Classify a raw response body.
    pub fn from_text(text: &str) -> Result<Self, NormalizeError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| NormalizeError::MalformedPayload(format!("invalid JSON: {}", e)))?;
        Self::classify(value)
    }

    fn classify_object(mut map: Map<String, Value>) -> Result<Self, NormalizeError> {
        for key in WRAPPER_KEYS {
            if matches!(map.get(key), Some(Value::Array(_))) {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(Payload::Wrapped(items));
                }
            }
        }

        if map.is_empty() {
            return Ok(Payload::Keyed(BTreeMap::new()));
        }

        if map.keys().all(|k| k.trim().parse::<u32>().is_ok()) {
            let keyed = map
                .into_iter()
                .filter_map(|(k, v)| k.trim().parse::<u32>().ok().map(|id| (id, v)))
                .collect();
            return Ok(Payload::Keyed(keyed));
        }

        if map.contains_key("hero_id") || map.contains_key("id") {
            return Ok(Payload::Single(map));
        }

        let mut keys: Vec<&String> = map.keys().collect();
        keys.truncate(5);
        Err(NormalizeError::MalformedPayload(format!(
            "object is neither keyed by hero id nor a record (keys: {:?})",
            keys
        )))
    }

    /// Flatten into entries, each with its map key when the payload was keyed.
    fn into_entries(self, stats_type: StatsType) -> Vec<Entry> {
        match self {
            Payload::Records(items) | Payload::Wrapped(items) => items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| match item {
                    Value::Object(fields) => Some(Entry::new(None, fields)),
                    other => {
                        warn!(
                            "Dropping {} entry #{}: expected object, got {}",
                            stats_type,
                            index,
                            kind_of(&other)
                        );
                        None
                    }
                })
                .collect(),
            Payload::Keyed(entries) => entries
                .into_iter()
                .filter_map(|(id, value)| match value {
                    Value::Object(fields) => Some(Entry::new(Some(id), fields)),
                    Value::Null => Some(Entry::new(Some(id), Map::new())),
                    scalar @ (Value::Number(_) | Value::String(_)) => {
                        let mut fields = Map::new();
                        fields.insert(stats_type.scalar_field().to_string(), scalar);
                        Some(Entry::new(Some(id), fields))
                    }
                    other => {
                        warn!(
                            "Dropping {} entry for hero {}: unsupported value {}",
                            stats_type,
                            id,
                            kind_of(&other)
                        );
                        None
                    }
                })
                .collect(),
            Payload::Single(fields) => vec![Entry::new(None, fields)],
        }
    }
}

/// One record's fields, with nested statistic blocks hoisted to the top.
struct Entry {
    key: Option<u32>,
    fields: Map<String, Value>,
}

impl Entry {
    fn new(key: Option<u32>, mut fields: Map<String, Value>) -> Self {
        for nested in NESTED_KEYS {
            if let Some(Value::Object(inner)) = fields.remove(nested) {
                for (k, v) in inner {
                    fields.entry(k).or_insert(v);
                }
            }
        }
        Self { key, fields }
    }

    /// First present, non-null value among `names`.
    fn get(&self, names: &[&str]) -> Option<&Value> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find(|v| !v.is_null())
    }

    fn number(&self, names: &[&str]) -> Option<f64> {
        self.get(names).and_then(coerce_number)
    }

    fn count(&self, names: &[&str]) -> Option<u32> {
        self.number(names)
            .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n.round() as u32)
    }

    fn id(&self, names: &[&str]) -> Option<HeroId> {
        self.get(names).and_then(coerce_id).map(HeroId::new)
    }

    fn text(&self, names: &[&str]) -> Option<String> {
        match self.get(names)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Converts API payloads into normalized records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    scale: RateScale,
}

impl Normalizer {
    pub fn new(scale: RateScale) -> Self {
        Self { scale }
    }

    /// Normalize a per-hero series (`raw`, `gpm`, `xpm`).
    ///
    /// Output order follows the payload for sequences and ascending hero id
    /// for keyed payloads. Entries without a hero id are dropped.
    pub fn stat_records(
        &self,
        payload: Value,
        stats_type: StatsType,
    ) -> Result<Vec<StatRecord>, NormalizeError> {
        let entries = Payload::classify(payload)?.into_entries(stats_type);
        let total = entries.len();
        let scale = self.series_scale(&entries, stats_type);

        let records: Vec<StatRecord> = entries
            .into_iter()
            .filter_map(|entry| self.stat_record(entry, stats_type, scale))
            .collect();

        debug!(
            "Normalized {} {} records ({} dropped)",
            records.len(),
            stats_type,
            total - records.len()
        );
        Ok(records)
    }

    fn stat_record(
        &self,
        entry: Entry,
        stats_type: StatsType,
        scale: RateScale,
    ) -> Option<StatRecord> {
        let Some(id) = entry
            .id(&["hero_id", "id"])
            .or(entry.key.map(HeroId::new))
        else {
            warn!("Dropping {} record without a hero id", stats_type);
            return None;
        };

        Some(StatRecord {
            id,
            display_name: entry.text(&["localized_name", "name"]).unwrap_or_default(),
            icon_ref: entry.text(&["icon", "img"]).unwrap_or_default(),
            win_rate: rate(&entry, RATE_FIELDS[0], scale),
            presence: rate(&entry, RATE_FIELDS[1], scale),
            kda: entry.number(&["kda"]),
            gpm: entry.number(&["gpm"]),
            xpm: entry.number(&["xpm"]),
            matches_count: entry.count(&["matches_count"]),
            picks_count: entry.count(&["picks_count"]),
            bans_count: entry.count(&["bans_count"]),
        })
    }

    /// Normalize an `against` or `with` series.
    ///
    /// When `my_hero` is given, rows lacking `my_hero_id` are attributed to
    /// it (the per-hero endpoint omits the field).
    pub fn matchups(
        &self,
        payload: Value,
        stats_type: StatsType,
        my_hero: Option<HeroId>,
    ) -> Result<Vec<MatchupRecord>, NormalizeError> {
        let entries = Payload::classify(payload)?.into_entries(stats_type);
        let scale = self.series_scale(&entries, stats_type);

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let my_hero_id = entry.id(&["my_hero_id"]).or(my_hero);
                let hero_id = entry.id(&["hero_id"]).or(entry.key.map(HeroId::new));
                match (my_hero_id, hero_id) {
                    (Some(my_hero_id), Some(hero_id)) => Some(MatchupRecord {
                        my_hero_id,
                        hero_id,
                        localized_name: entry.text(&["localized_name", "name"]),
                        win_rate: rate(&entry, RATE_FIELDS[0], scale),
                    }),
                    _ => {
                        warn!("Dropping {} record without hero ids", stats_type);
                        None
                    }
                }
            })
            .collect())
    }

    /// Normalize an `item` series.
    pub fn items(&self, payload: Value) -> Result<Vec<ItemRecord>, NormalizeError> {
        let entries = Payload::classify(payload)?.into_entries(StatsType::Item);
        let scale = self.series_scale(&entries, StatsType::Item);

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let Some(hero_id) = entry.id(&["hero_id"]).or(entry.key.map(HeroId::new)) else {
                    warn!("Dropping item record without a hero id");
                    return None;
                };
                Some(ItemRecord {
                    hero_id,
                    item_id: entry.get(&["item_id"]).and_then(coerce_id),
                    item_name: entry.text(&["item_name", "localized_name", "name"]),
                    win_rate: rate(&entry, RATE_FIELDS[0], scale),
                    usage: rate(&entry, RATE_FIELDS[2], scale),
                })
            })
            .collect())
    }

    /// Normalize a per-hero response into that hero's record.
    ///
    /// The per-hero endpoint may answer with a bare record that carries no
    /// id; such a record is attributed to `hero`.
    pub fn hero_record(
        &self,
        payload: Value,
        stats_type: StatsType,
        hero: HeroId,
    ) -> Result<Option<StatRecord>, NormalizeError> {
        let payload = match unwrap_json_string(payload, MAX_STRING_DEPTH)? {
            Value::Object(mut fields) if is_bare_record(&fields) => {
                fields.insert("hero_id".to_string(), Value::from(hero.get()));
                Value::Object(fields)
            }
            other => other,
        };
        Ok(self
            .stat_records(payload, stats_type)?
            .into_iter()
            .find(|r| r.id == hero))
    }

    fn series_scale(&self, entries: &[Entry], stats_type: StatsType) -> RateScale {
        let scale = self.scale.resolve(
            entries
                .iter()
                .flat_map(|entry| RATE_FIELDS.iter().filter_map(move |names| entry.number(names))),
        );
        if self.scale == RateScale::Auto {
            debug!("Reading {} rates as {:?}", stats_type, scale);
        }
        scale
    }
}

fn rate(entry: &Entry, names: &[&str], scale: RateScale) -> Option<f64> {
    entry.number(names).map(|v| scale.to_fraction(v))
}

fn unwrap_json_string(value: Value, depth: usize) -> Result<Value, NormalizeError> {
    match value {
        Value::String(text) if depth > 0 => {
            let inner: Value = serde_json::from_str(&text).map_err(|e| {
                NormalizeError::MalformedPayload(format!("string body is not JSON: {}", e))
            })?;
            unwrap_json_string(inner, depth - 1)
        }
        other => Ok(other),
    }
}

/// A non-empty object that is neither a wrapper, keyed by hero id, nor
/// carrying an id of its own.
fn is_bare_record(fields: &Map<String, Value>) -> bool {
    !fields.is_empty()
        && !fields.contains_key("hero_id")
        && !fields.contains_key("id")
        && !WRAPPER_KEYS
            .iter()
            .any(|k| matches!(fields.get(*k), Some(Value::Array(_))))
        && !fields.keys().all(|k| k.trim().parse::<u32>().is_ok())
}

/// Numbers and numeric strings; anything else is absent.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
