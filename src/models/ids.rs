//! Hero identifiers and deterministic data-set fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Integer key naming a hero within the statistics domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(u32);

impl HeroId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for HeroId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for HeroId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Fingerprint of an ordered data set, used to detect when a paged
/// listing has been replaced by a different one.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DatasetId(String);

impl DatasetId {
    /// Generate a DatasetId from input fields.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let result = hasher.finalize();
        let hash = hex::encode(result);
        Self(hash[..16].to_string())
    }

    /// Fingerprint a tagged, ordered sequence of keys.
    pub fn of_keys<I, K>(tag: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: fmt::Display,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.to_string()).collect();
        let mut fields: Vec<&str> = Vec::with_capacity(keys.len() + 1);
        fields.push(tag);
        fields.extend(keys.iter().map(String::as_str));
        Self::generate(&fields)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatasetId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_id_parse() {
        assert_eq!("14".parse::<HeroId>().unwrap(), HeroId::new(14));
        assert_eq!(" 2 ".parse::<HeroId>().unwrap(), HeroId::new(2));
        assert!("axe".parse::<HeroId>().is_err());
        assert!("-1".parse::<HeroId>().is_err());
    }

    #[test]
    fn test_hero_id_serializes_as_number() {
        let json = serde_json::to_string(&HeroId::new(7)).unwrap();
        assert_eq!(json, "7");
        let parsed: HeroId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, HeroId::new(7));
    }

    #[test]
    fn test_dataset_id_deterministic() {
        let a = DatasetId::of_keys("heroes", [1, 2, 3].map(HeroId::new));
        let b = DatasetId::of_keys("heroes", [1, 2, 3].map(HeroId::new));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_dataset_id_order_sensitive() {
        let a = DatasetId::of_keys("heroes", [1, 2].map(HeroId::new));
        let b = DatasetId::of_keys("heroes", [2, 1].map(HeroId::new));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dataset_id_tag_sensitive() {
        let a = DatasetId::of_keys("43", [1].map(HeroId::new));
        let b = DatasetId::of_keys("44", [1].map(HeroId::new));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dataset_id_field_separator() {
        // "1|23" and "12|3" must not collide
        let a = DatasetId::generate(&["1", "23"]);
        let b = DatasetId::generate(&["12", "3"]);
        assert_ne!(a, b);
    }
}
