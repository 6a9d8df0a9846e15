//! Rating brackets and statistic series types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every rank-bracket code the stats backend accepts.
pub const RATING_CODES: [u8; 36] = [
    11, 12, 13, 14, 15, //
    21, 22, 23, 24, 25, //
    31, 32, 33, 34, 35, //
    41, 42, 43, 44, 45, //
    51, 52, 53, 54, 55, //
    61, 62, 63, 64, 65, //
    71, 72, 73, 74, 75, //
    81,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRatingError {
    #[error("invalid rating bracket '{0}', expected one of 11-15, 21-25, ..., 71-75, 81")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stats type '{0}', expected raw, xpm, gpm, against, with or item")]
pub struct ParseStatsTypeError(String);

/// Skill-rank segment used to scope statistics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RatingCode", into = "String")]
pub struct RatingBracket(u8);

/// A bracket code as it appears in JSON or TOML: `43` or `"43"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RatingCode {
    Number(i64),
    Text(String),
}

impl RatingBracket {
    /// Bracket used when the caller does not choose one.
    pub const DEFAULT: RatingBracket = RatingBracket(43);

    pub fn new(code: u8) -> Result<Self, ParseRatingError> {
        if RATING_CODES.contains(&code) {
            Ok(Self(code))
        } else {
            Err(ParseRatingError::Unknown(code.to_string()))
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Iterate over all accepted brackets in ascending order.
    pub fn all() -> impl Iterator<Item = RatingBracket> {
        RATING_CODES.iter().map(|&c| RatingBracket(c))
    }
}

impl Default for RatingBracket {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RatingBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RatingBracket {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u8 = s
            .trim()
            .parse()
            .map_err(|_| ParseRatingError::Unknown(s.to_string()))?;
        Self::new(code).map_err(|_| ParseRatingError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for RatingBracket {
    type Error = ParseRatingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<RatingCode> for RatingBracket {
    type Error = ParseRatingError;

    fn try_from(code: RatingCode) -> Result<Self, Self::Error> {
        match code {
            RatingCode::Number(n) => u8::try_from(n)
                .map_err(|_| ParseRatingError::Unknown(n.to_string()))
                .and_then(Self::new),
            RatingCode::Text(s) => s.parse(),
        }
    }
}

impl From<RatingBracket> for String {
    fn from(r: RatingBracket) -> Self {
        r.to_string()
    }
}

/// Kind of statistic series served by the stats endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsType {
    Raw,
    Xpm,
    Gpm,
    Against,
    With,
    Item,
}

impl StatsType {
    pub fn as_str(self) -> &'static str {
        match self {
            StatsType::Raw => "raw",
            StatsType::Xpm => "xpm",
            StatsType::Gpm => "gpm",
            StatsType::Against => "against",
            StatsType::With => "with",
            StatsType::Item => "item",
        }
    }

    /// Field a bare scalar value stands for in a keyed payload of this type.
    pub fn scalar_field(self) -> &'static str {
        match self {
            StatsType::Gpm => "gpm",
            StatsType::Xpm => "xpm",
            _ => "win_rate",
        }
    }

    /// Whether records of this type are hero-vs-hero matchups.
    pub fn is_matchup(self) -> bool {
        matches!(self, StatsType::Against | StatsType::With)
    }
}

impl fmt::Display for StatsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatsType {
    type Err = ParseStatsTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(StatsType::Raw),
            "xpm" => Ok(StatsType::Xpm),
            "gpm" => Ok(StatsType::Gpm),
            "against" => Ok(StatsType::Against),
            "with" => Ok(StatsType::With),
            "item" => Ok(StatsType::Item),
            other => Err(ParseStatsTypeError(other.to_string())),
        }
    }
}
