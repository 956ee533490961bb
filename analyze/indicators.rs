//! # Survey Indicator Schema
//!
//! The twelve survey indicators and the four thematic domains they belong to.
//! Column names and domain membership are fixed: they are the hard contract
//! between the input table, the one-hot encoding layout, and the weight table.
//! The canonical indicator order defined here is the order of the flattened
//! coefficient vector and of every report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four thematic groupings of indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Socioeconomic,
    Behavioral,
    Psychological,
    Social,
}

impl Domain {
    /// All domains, in the order their indicators appear in the canonical list.
    pub const ALL: [Domain; 4] = [
        Domain::Socioeconomic,
        Domain::Behavioral,
        Domain::Psychological,
        Domain::Social,
    ];

    /// The three indicators of this domain, in canonical order.
    pub fn indicators(self) -> [Indicator; 3] {
        match self {
            Domain::Socioeconomic => [
                Indicator::Income,
                Indicator::Education,
                Indicator::Employment,
            ],
            Domain::Behavioral => [Indicator::Sleep, Indicator::Appetite, Indicator::Energy],
            Domain::Psychological => [Indicator::Mood, Indicator::Interest, Indicator::Anxiety],
            Domain::Social => [
                Indicator::Relationships,
                Indicator::Support,
                Indicator::Isolation,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::Socioeconomic => "socioeconomic",
            Domain::Behavioral => "behavioral",
            Domain::Psychological => "psychological",
            Domain::Social => "social",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single categorical survey indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Income,
    Education,
    Employment,
    Sleep,
    Appetite,
    Energy,
    Mood,
    Interest,
    Anxiety,
    Relationships,
    Support,
    Isolation,
}

impl Indicator {
    /// Canonical indicator order. Column `j` of the indicator matrix and the
    /// `j`-th coefficient slice both refer to `Indicator::ALL[j]`.
    pub const ALL: [Indicator; 12] = [
        Indicator::Income,
        Indicator::Education,
        Indicator::Employment,
        Indicator::Sleep,
        Indicator::Appetite,
        Indicator::Energy,
        Indicator::Mood,
        Indicator::Interest,
        Indicator::Anxiety,
        Indicator::Relationships,
        Indicator::Support,
        Indicator::Isolation,
    ];

    /// The input column name for this indicator.
    pub fn name(self) -> &'static str {
        match self {
            Indicator::Income => "income",
            Indicator::Education => "education",
            Indicator::Employment => "employment",
            Indicator::Sleep => "sleep",
            Indicator::Appetite => "appetite",
            Indicator::Energy => "energy",
            Indicator::Mood => "mood",
            Indicator::Interest => "interest",
            Indicator::Anxiety => "anxiety",
            Indicator::Relationships => "relationships",
            Indicator::Support => "support",
            Indicator::Isolation => "isolation",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Indicator::Income | Indicator::Education | Indicator::Employment => {
                Domain::Socioeconomic
            }
            Indicator::Sleep | Indicator::Appetite | Indicator::Energy => Domain::Behavioral,
            Indicator::Mood | Indicator::Interest | Indicator::Anxiety => Domain::Psychological,
            Indicator::Relationships | Indicator::Support | Indicator::Isolation => Domain::Social,
        }
    }

    /// Position of this indicator in [`Indicator::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name one of the twelve indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIndicator(pub String);

impl fmt::Display for UnknownIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not one of the twelve survey indicators", self.0)
    }
}

impl std::error::Error for UnknownIndicator {}

impl FromStr for Indicator {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Indicator::ALL
            .iter()
            .copied()
            .find(|indicator| indicator.name() == s)
            .ok_or_else(|| UnknownIndicator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_domains_partition_the_indicators() {
        let mut seen = HashSet::new();
        for domain in Domain::ALL {
            for indicator in domain.indicators() {
                assert_eq!(indicator.domain(), domain);
                assert!(seen.insert(indicator), "{indicator} listed twice");
            }
        }
        assert_eq!(seen.len(), Indicator::ALL.len());
    }

    #[test]
    fn test_canonical_order_matches_index() {
        for (position, indicator) in Indicator::ALL.iter().enumerate() {
            assert_eq!(indicator.index(), position);
        }
        // Domain blocks are contiguous in the canonical order.
        let flattened: Vec<Indicator> = Domain::ALL
            .iter()
            .flat_map(|domain| domain.indicators())
            .collect();
        assert_eq!(flattened, Indicator::ALL.to_vec());
    }

    #[test]
    fn test_parse_round_trip() {
        for indicator in Indicator::ALL {
            assert_eq!(indicator.name().parse::<Indicator>().unwrap(), indicator);
        }
        let err = "happiness".parse::<Indicator>().unwrap_err();
        assert_eq!(err, UnknownIndicator("happiness".to_string()));
    }
}
