//! Joins independently fetched statistic series into combined records.
//!
//! The join is a left outer join on [`HeroId`]: every primary entity appears
//! exactly once, secondary-only ids are ignored, and an entity missing from
//! a secondary series keeps that series' fields as `None`. Secondaries are
//! keyed by [`StatsType`], so the order they arrive in never matters.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::models::{CombinedRecord, HeroId, StatRecord, StatsType};

/// Secondary series collected for one join, at most one per stats type.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    series: BTreeMap<StatsType, HashMap<HeroId, StatRecord>>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series. Within a series the first record for an id wins.
    ///
    /// Returns `false` (and keeps the existing series) when a series of the
    /// same type was already added.
    pub fn insert(&mut self, stats_type: StatsType, records: Vec<StatRecord>) -> bool {
        if self.series.contains_key(&stats_type) {
            warn!("Ignoring duplicate {} series", stats_type);
            return false;
        }

        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            by_id.entry(record.id).or_insert(record);
        }
        self.series.insert(stats_type, by_id);
        true
    }

    pub fn with(mut self, stats_type: StatsType, records: Vec<StatRecord>) -> Self {
        self.insert(stats_type, records);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn get(&self, stats_type: StatsType, id: HeroId) -> Option<&StatRecord> {
        self.series.get(&stats_type).and_then(|s| s.get(&id))
    }
}

/// Copy the fields a series contributes onto a combined record.
fn merge_series(target: &mut CombinedRecord, stats_type: StatsType, source: Option<&StatRecord>) {
    let stats = &mut target.stats;
    match stats_type {
        StatsType::Raw => {
            stats.win_rate = source.and_then(|s| s.win_rate);
            stats.presence = source.and_then(|s| s.presence);
            stats.kda = source.and_then(|s| s.kda);
            stats.matches_count = source.and_then(|s| s.matches_count);
            stats.picks_count = source.and_then(|s| s.picks_count);
            stats.bans_count = source.and_then(|s| s.bans_count);
        }
        StatsType::Gpm => stats.gpm = source.and_then(|s| s.gpm),
        StatsType::Xpm => stats.xpm = source.and_then(|s| s.xpm),
        StatsType::Against | StatsType::With | StatsType::Item => {}
    }

    if let Some(source) = source {
        if stats.display_name.is_empty() && !source.display_name.is_empty() {
            stats.display_name = source.display_name.clone();
        }
        if stats.icon_ref.is_empty() && !source.icon_ref.is_empty() {
            stats.icon_ref = source.icon_ref.clone();
        }
    }
}

/// Left-outer-join `series` onto `primary`.
///
/// Duplicate primary ids keep their first occurrence.
pub fn aggregate<I>(primary: I, series: &SeriesSet) -> Vec<CombinedRecord>
where
    I: IntoIterator<Item = CombinedRecord>,
{
    let mut seen = HashSet::new();
    let mut combined = Vec::new();

    for mut record in primary {
        if !seen.insert(record.id()) {
            warn!("Duplicate primary record for hero {}, keeping first", record.id());
            continue;
        }

        for &stats_type in series.series.keys() {
            let source = series.get(stats_type, record.id());
            merge_series(&mut record, stats_type, source);
        }
        combined.push(record);
    }

    debug!(
        "Aggregated {} records from {} secondary series",
        combined.len(),
        series.len()
    );
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hero, PrimaryAttr};
    use pretty_assertions::assert_eq;

    fn hero(id: u32, name: &str, attr: PrimaryAttr) -> CombinedRecord {
        let hero: Hero = serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("npc_dota_hero_{}", name.to_lowercase()),
            "localized_name": name,
            "primary_attr": attr.code(),
        }))
        .unwrap();
        CombinedRecord::from(&hero)
    }

    fn catalog() -> Vec<CombinedRecord> {
        vec![
            hero(1, "Anti-Mage", PrimaryAttr::Agility),
            hero(2, "Axe", PrimaryAttr::Strength),
            hero(3, "Bane", PrimaryAttr::Universal),
        ]
    }

    fn raw(id: u32, win_rate: f64) -> StatRecord {
        StatRecord {
            presence: Some(0.1),
            kda: Some(2.5),
            ..StatRecord::empty(HeroId::new(id)).with_win_rate(win_rate)
        }
    }

    fn gpm(id: u32, value: f64) -> StatRecord {
        StatRecord {
            gpm: Some(value),
            ..StatRecord::empty(HeroId::new(id))
        }
    }

    fn xpm(id: u32, value: f64) -> StatRecord {
        StatRecord {
            xpm: Some(value),
            ..StatRecord::empty(HeroId::new(id))
        }
    }

    #[test]
    fn test_join_fills_fields_from_each_series() {
        let series = SeriesSet::new()
            .with(StatsType::Raw, vec![raw(1, 0.48), raw(2, 0.55)])
            .with(StatsType::Gpm, vec![gpm(1, 640.0)])
            .with(StatsType::Xpm, vec![xpm(2, 590.0)]);

        let combined = aggregate(catalog(), &series);
        assert_eq!(combined.len(), 3);

        let am = &combined[0].stats;
        assert_eq!(am.win_rate, Some(0.48));
        assert_eq!(am.gpm, Some(640.0));
        assert_eq!(am.xpm, None);

        let axe = &combined[1].stats;
        assert_eq!(axe.win_rate, Some(0.55));
        assert_eq!(axe.kda, Some(2.5));
        assert_eq!(axe.gpm, None);
        assert_eq!(axe.xpm, Some(590.0));
    }

    #[test]
    fn test_missing_secondary_entity_yields_absent_fields() {
        let series = SeriesSet::new()
            .with(StatsType::Raw, vec![raw(1, 0.5), raw(3, 0.5)])
            .with(StatsType::Gpm, vec![gpm(1, 500.0), gpm(3, 510.0)]);

        let combined = aggregate(catalog(), &series);
        let axe = combined.iter().find(|r| r.id() == HeroId::new(2)).unwrap();
        assert_eq!(axe.display_name(), "Axe");
        assert_eq!(axe.stats.win_rate, None);
        assert_eq!(axe.stats.presence, None);
        assert_eq!(axe.stats.gpm, None);
    }

    #[test]
    fn test_every_primary_id_exactly_once() {
        let mut primary = catalog();
        primary.push(hero(2, "Axe again", PrimaryAttr::Strength));
        let series = SeriesSet::new().with(StatsType::Raw, vec![raw(2, 0.5), raw(99, 0.9)]);

        let combined = aggregate(primary, &series);
        let ids: Vec<u32> = combined.iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(combined[1].display_name(), "Axe");
    }

    #[test]
    fn test_secondary_only_ids_ignored() {
        let series = SeriesSet::new().with(StatsType::Gpm, vec![gpm(42, 700.0)]);
        let combined = aggregate(catalog(), &series);
        assert!(combined.iter().all(|r| r.id() != HeroId::new(42)));
        assert!(combined.iter().all(|r| r.stats.gpm.is_none()));
    }

    #[test]
    fn test_join_order_independent() {
        let raw_series = vec![raw(3, 0.41), raw(1, 0.52)];
        let gpm_series = vec![gpm(2, 480.0), gpm(1, 620.0)];
        let xpm_series = vec![xpm(1, 700.0), xpm(3, 455.0)];

        let forward = SeriesSet::new()
            .with(StatsType::Raw, raw_series.clone())
            .with(StatsType::Gpm, gpm_series.clone())
            .with(StatsType::Xpm, xpm_series.clone());
        let reversed = SeriesSet::new()
            .with(StatsType::Xpm, xpm_series.clone())
            .with(StatsType::Gpm, gpm_series.clone())
            .with(StatsType::Raw, raw_series.clone());
        let shuffled = SeriesSet::new()
            .with(StatsType::Gpm, gpm_series.into_iter().rev().collect())
            .with(StatsType::Raw, raw_series.into_iter().rev().collect())
            .with(StatsType::Xpm, xpm_series);

        let a = aggregate(catalog(), &forward);
        assert_eq!(a, aggregate(catalog(), &reversed));
        assert_eq!(a, aggregate(catalog(), &shuffled));
    }

    #[test]
    fn test_duplicate_series_type_keeps_first() {
        let mut set = SeriesSet::new();
        assert!(set.insert(StatsType::Gpm, vec![gpm(1, 600.0)]));
        assert!(!set.insert(StatsType::Gpm, vec![gpm(1, 100.0)]));

        let combined = aggregate(catalog(), &set);
        assert_eq!(combined[0].stats.gpm, Some(600.0));
    }

    #[test]
    fn test_duplicate_secondary_record_keeps_first() {
        let set = SeriesSet::new().with(StatsType::Raw, vec![raw(1, 0.6), raw(1, 0.1)]);
        let combined = aggregate(catalog(), &set);
        assert_eq!(combined[0].stats.win_rate, Some(0.6));
    }

    #[test]
    fn test_primary_from_stat_series_takes_names_from_secondary() {
        let primary = vec![CombinedRecord::from(StatRecord::empty(HeroId::new(2)))];
        let set = SeriesSet::new().with(
            StatsType::Raw,
            vec![StatRecord {
                icon_ref: "/axe.png".to_string(),
                ..raw(2, 0.5).with_name("Axe")
            }],
        );
        let combined = aggregate(primary, &set);
        assert_eq!(combined[0].display_name(), "Axe");
        assert_eq!(combined[0].stats.icon_ref, "/axe.png");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(aggregate(Vec::new(), &SeriesSet::new()).is_empty());
        let combined = aggregate(catalog(), &SeriesSet::new());
        assert_eq!(combined, catalog());
    }
}
