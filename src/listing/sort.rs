//! Sort and filter state for hero listings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CombinedRecord, PrimaryAttr};

/// Column a hero listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Name,
    WinRate,
    Presence,
    Kda,
    Gpm,
    Xpm,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::WinRate => "win-rate",
            SortKey::Presence => "presence",
            SortKey::Kda => "kda",
            SortKey::Gpm => "gpm",
            SortKey::Xpm => "xpm",
        }
    }

    fn numeric_value(self, record: &CombinedRecord) -> Option<f64> {
        let stats = &record.stats;
        match self {
            SortKey::Name => None,
            SortKey::WinRate => stats.win_rate,
            SortKey::Presence => stats.presence,
            SortKey::Kda => stats.kda,
            SortKey::Gpm => stats.gpm,
            SortKey::Xpm => stats.xpm,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "name" => Ok(SortKey::Name),
            "win-rate" | "winrate" => Ok(SortKey::WinRate),
            "presence" => Ok(SortKey::Presence),
            "kda" => Ok(SortKey::Kda),
            "gpm" => Ok(SortKey::Gpm),
            "xpm" => Ok(SortKey::Xpm),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Category predicate; `Any` matches every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    Any,
    Only(PrimaryAttr),
}

impl CategoryFilter {
    pub fn matches(self, category: Option<PrimaryAttr>) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Only(attr) => category == Some(attr),
        }
    }

    /// Short tag used when fingerprinting a filtered listing.
    pub fn tag(self) -> &'static str {
        match self {
            CategoryFilter::Any => "any",
            CategoryFilter::Only(attr) => attr.code(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    /// `all`/`any` select every hero; use `universal` for the
    /// universal attribute.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "any" | "" => Ok(CategoryFilter::Any),
            "uni" | "universal" => Ok(CategoryFilter::Only(PrimaryAttr::Universal)),
            other => other.parse().map(CategoryFilter::Only),
        }
    }
}

/// Transient listing state owned by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortFilterState {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub search_text: String,
    pub category: CategoryFilter,
}

impl Default for SortFilterState {
    fn default() -> Self {
        Self {
            sort_key: SortKey::WinRate,
            direction: SortDirection::Descending,
            search_text: String::new(),
            category: CategoryFilter::Any,
        }
    }
}

impl SortFilterState {
    /// Same key reverses direction; a new key starts descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.reversed();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Descending;
        }
    }

    pub fn matches(&self, record: &CombinedRecord) -> bool {
        let needle = self.search_text.trim().to_lowercase();
        let name_match = needle.is_empty() || record.display_name().to_lowercase().contains(&needle);
        name_match && self.category.matches(record.primary_attr)
    }

    /// Ordering of two records under the current key and direction.
    ///
    /// Names compare by their Unicode lowercase form, without locale
    /// collation. Records missing the sort value rank below any real value.
    /// Ties fall back to ascending hero id, so the ordering is total.
    pub fn compare(&self, a: &CombinedRecord, b: &CombinedRecord) -> Ordering {
        let primary = match self.sort_key {
            SortKey::Name => a
                .display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase()),
            key => compare_missing_lowest(key.numeric_value(a), key.numeric_value(b)),
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }

    /// Filter then sort. Pure and idempotent.
    pub fn apply<'a>(&self, records: &'a [CombinedRecord]) -> Vec<&'a CombinedRecord> {
        let mut visible: Vec<&CombinedRecord> =
            records.iter().filter(|r| self.matches(r)).collect();
        visible.sort_by(|a, b| self.compare(a, b));
        visible
    }
}

pub(crate) fn compare_missing_lowest(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeroId, StatRecord};
    use pretty_assertions::assert_eq;

    fn rec(id: u32, name: &str, win_rate: Option<f64>, attr: PrimaryAttr) -> CombinedRecord {
        CombinedRecord {
            stats: StatRecord {
                win_rate,
                ..StatRecord::empty(HeroId::new(id)).with_name(name)
            },
            primary_attr: Some(attr),
        }
    }

    fn names(records: &[&CombinedRecord]) -> Vec<String> {
        records.iter().map(|r| r.display_name().to_string()).collect()
    }

    fn sample() -> Vec<CombinedRecord> {
        vec![
            rec(1, "Anti-Mage", Some(0.48), PrimaryAttr::Agility),
            rec(2, "Axe", Some(0.552), PrimaryAttr::Strength),
            rec(3, "Bane", Some(0.40), PrimaryAttr::Universal),
            rec(4, "Bloodseeker", None, PrimaryAttr::Agility),
            rec(5, "Crystal Maiden", Some(0.51), PrimaryAttr::Intelligence),
        ]
    }

    #[test]
    fn test_axe_bane_scenario() {
        let records = vec![
            rec(1, "Axe", Some(0.552), PrimaryAttr::Strength),
            rec(2, "Bane", Some(0.40), PrimaryAttr::Universal),
        ];
        let mut state = SortFilterState::default();
        assert_eq!(names(&state.apply(&records)), vec!["Axe", "Bane"]);

        state.toggle_sort(SortKey::WinRate);
        assert_eq!(state.direction, SortDirection::Ascending);
        assert_eq!(names(&state.apply(&records)), vec!["Bane", "Axe"]);
    }

    #[test]
    fn test_name_sort_folds_case_beyond_ascii() {
        let records = vec![
            rec(1, "ÉCLAIR", None, PrimaryAttr::Agility),
            rec(2, "éa", None, PrimaryAttr::Agility),
            rec(3, "Axe", None, PrimaryAttr::Strength),
            rec(4, "axe", None, PrimaryAttr::Strength),
        ];
        let mut state = SortFilterState::default();
        state.toggle_sort(SortKey::Name);
        state.toggle_sort(SortKey::Name);
        assert_eq!(state.direction, SortDirection::Ascending);
        assert_eq!(
            names(&state.apply(&records)),
            vec!["Axe", "axe", "éa", "ÉCLAIR"]
        );
    }

    #[test]
    fn test_missing_values_sort_lowest() {
        let records = sample();
        let mut state = SortFilterState::default();
        let desc = state.apply(&records);
        assert_eq!(desc.last().unwrap().display_name(), "Bloodseeker");

        state.toggle_sort(SortKey::WinRate);
        let asc = state.apply(&records);
        assert_eq!(asc.first().unwrap().display_name(), "Bloodseeker");
    }

    #[test]
    fn test_missing_does_not_tie_with_negative_values() {
        let records = vec![
            rec(1, "Missing", None, PrimaryAttr::Strength),
            rec(2, "Negative", Some(-1.0), PrimaryAttr::Strength),
        ];
        let state = SortFilterState::default();
        assert_eq!(names(&state.apply(&records)), vec!["Negative", "Missing"]);
    }

    #[test]
    fn test_new_key_resets_to_descending() {
        let mut state = SortFilterState::default();
        state.toggle_sort(SortKey::WinRate);
        assert_eq!(state.direction, SortDirection::Ascending);

        state.toggle_sort(SortKey::Name);
        assert_eq!(state.sort_key, SortKey::Name);
        assert_eq!(state.direction, SortDirection::Descending);
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let records = vec![
            rec(1, "bane", None, PrimaryAttr::Universal),
            rec(2, "Axe", None, PrimaryAttr::Strength),
            rec(3, "Clinkz", None, PrimaryAttr::Agility),
        ];
        let mut state = SortFilterState::default();
        state.toggle_sort(SortKey::Name);
        state.toggle_sort(SortKey::Name);
        assert_eq!(names(&state.apply(&records)), vec!["Axe", "bane", "Clinkz"]);
    }

    #[test]
    fn test_double_toggle_restores_order() {
        let records = sample();
        for key in [SortKey::Name, SortKey::WinRate] {
            let mut state = SortFilterState::default();
            state.toggle_sort(key);
            let before = names(&state.apply(&records));
            state.toggle_sort(key);
            state.toggle_sort(key);
            assert_eq!(names(&state.apply(&records)), before);
        }
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut records = sample();
        records.push(rec(6, "Dazzle", Some(0.48), PrimaryAttr::Universal));
        let state = SortFilterState::default();

        let once: Vec<CombinedRecord> = state.apply(&records).into_iter().cloned().collect();
        let twice: Vec<CombinedRecord> = state.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ties_break_on_id() {
        let records = vec![
            rec(9, "Zeus", Some(0.5), PrimaryAttr::Intelligence),
            rec(3, "Bane", Some(0.5), PrimaryAttr::Universal),
        ];
        let state = SortFilterState::default();
        let sorted = state.apply(&records);
        assert_eq!(sorted[0].id(), HeroId::new(3));
    }

    #[test]
    fn test_filter_by_search_and_category() {
        let records = sample();
        let state = SortFilterState {
            search_text: "A".to_string(),
            category: CategoryFilter::Only(PrimaryAttr::Agility),
            ..Default::default()
        };
        assert_eq!(names(&state.apply(&records)), vec!["Anti-Mage"]);

        let state = SortFilterState {
            search_text: "  mAiDeN ".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&state.apply(&records)), vec!["Crystal Maiden"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = sample();
        let state = SortFilterState {
            search_text: "a".to_string(),
            category: CategoryFilter::Only(PrimaryAttr::Agility),
            ..Default::default()
        };
        let once: Vec<CombinedRecord> = state.apply(&records).into_iter().cloned().collect();
        let twice: Vec<CombinedRecord> = state.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::Any);
        assert_eq!(
            "str".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(PrimaryAttr::Strength)
        );
        assert_eq!(
            "universal".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(PrimaryAttr::Universal)
        );
        assert!("luck".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("win_rate".parse::<SortKey>().unwrap(), SortKey::WinRate);
        assert_eq!("GPM".parse::<SortKey>().unwrap(), SortKey::Gpm);
        assert!("speed".parse::<SortKey>().is_err());
    }
}
