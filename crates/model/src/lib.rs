//! Core domain model for first-name / last-name compatibility scoring.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `NameEntry`: one first or last name with its precomputed phonetic metrics
//! - `StatisticalModel`: the pre-trained conditional probability tables
//! - `WeightVector`: one validated scoring configuration
//! - `ScoredPair`: the result of pairing a first name with a last name

mod artifact;
mod dataset;
mod weights;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use artifact::{
    ConditionalTable, Distribution, ModelLoadError, StatisticalModel, TableComponent, DEFAULT_ROW,
};
pub use dataset::{select_top_entries, Dataset, DatasetError, NamePool};
pub use weights::{
    parse_assignment, WeightError, WeightVector, WeightVectorBuilder, WEIGHT_BUDGET, WEIGHT_TOLERANCE,
};

/// One axis of phonetic comparison that carries a user-adjustable weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKey {
    VowelLocation,
    /// Serialized with the artifact's historical spelling.
    #[serde(rename = "vowel_openess", alias = "vowel_openness")]
    VowelOpenness,
    Softness,
    Tone,
    Rhythm,
    Length,
    Alliteration,
    HeadTransition,
    EndStartTransition,
    Oddness,
}

impl ComponentKey {
    pub const ALL: [ComponentKey; 10] = [
        Self::VowelLocation,
        Self::VowelOpenness,
        Self::Softness,
        Self::Tone,
        Self::Rhythm,
        Self::Length,
        Self::Alliteration,
        Self::HeadTransition,
        Self::EndStartTransition,
        Self::Oddness,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Stable position of this key in `ALL`, used for fixed-size score arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VowelLocation => "vowel_location",
            Self::VowelOpenness => "vowel_openess",
            Self::Softness => "softness",
            Self::Tone => "tone",
            Self::Rhythm => "rhythm",
            Self::Length => "length",
            Self::Alliteration => "alliteration",
            Self::HeadTransition => "head_transition",
            Self::EndStartTransition => "end_start_transition",
            Self::Oddness => "oddness",
        }
    }

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::VowelLocation => "Vowel harmony",
            Self::VowelOpenness => "Vowel openness",
            Self::Softness => "Consonant softness",
            Self::Tone => "Tone (bouba/kiki)",
            Self::Rhythm => "Rhythm",
            Self::Length => "Length balance",
            Self::Alliteration => "Alliteration",
            Self::HeadTransition => "Initial sounds",
            Self::EndStartTransition => "First-to-last junction",
            Self::Oddness => "Rarity",
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKey {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vowel_location" => Ok(Self::VowelLocation),
            "vowel_openess" | "vowel_openness" => Ok(Self::VowelOpenness),
            "softness" => Ok(Self::Softness),
            "tone" => Ok(Self::Tone),
            "rhythm" => Ok(Self::Rhythm),
            "length" => Ok(Self::Length),
            "alliteration" => Ok(Self::Alliteration),
            "head_transition" => Ok(Self::HeadTransition),
            // Older artifacts called the junction component this.
            "end_start_transition" | "junction_transition" => Ok(Self::EndStartTransition),
            "oddness" => Ok(Self::Oddness),
            other => Err(WeightError::UnknownComponent(other.to_string())),
        }
    }
}

/// Bearer counts for a name.
///
/// First names carry a breakdown by gender and period; last names a single
/// integer. Both expose the same `total()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Popularity {
    Count(u64),
    Breakdown(PopularityBreakdown),
}

impl Default for Popularity {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl Popularity {
    pub fn total(&self) -> u64 {
        match self {
            Self::Count(n) => *n,
            Self::Breakdown(b) => b.total,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopularityBreakdown {
    #[serde(default)]
    pub total: u64,

    /// Counts keyed by gender label ("female", "male", ...)
    #[serde(default)]
    pub by_gender: BTreeMap<String, u64>,

    /// Counts keyed by birth period ("1990-1999", ...)
    #[serde(default)]
    pub by_period: BTreeMap<String, u64>,
}

/// Precomputed scalar features of a whole name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NameMetrics {
    #[serde(default)]
    pub front_ratio: f64,
    #[serde(default)]
    pub back_ratio: f64,
    #[serde(default)]
    pub open_ratio: f64,
    #[serde(default)]
    pub close_ratio: f64,
    #[serde(default = "balanced_softness")]
    pub soft_ratio: f64,
    #[serde(default)]
    pub valence: f64,
    /// Letter count of the written form
    #[serde(default)]
    pub length: u32,
    /// Syllable count
    #[serde(default)]
    pub syllables: u32,
}

fn balanced_softness() -> f64 {
    0.5
}

impl Default for NameMetrics {
    fn default() -> Self {
        Self {
            front_ratio: 0.0,
            back_ratio: 0.0,
            open_ratio: 0.0,
            close_ratio: 0.0,
            soft_ratio: balanced_softness(),
            valence: 0.0,
            length: 0,
            syllables: 0,
        }
    }
}

/// Categorical phoneme-group labels at the edges of a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionGroups {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// One first or last name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameEntry {
    /// Canonical lowercase identifier, unique within its pool
    #[serde(alias = "name")]
    pub key: String,

    /// Presentation form (original casing)
    #[serde(default)]
    pub display: String,

    #[serde(default)]
    pub popularity: Popularity,

    #[serde(default)]
    pub metrics: NameMetrics,

    /// Syllable-delimited phonemic string ("kris-ti-an")
    #[serde(default)]
    pub phonetic_transcription: String,

    /// Simplified phonemic form used for alliteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplified_transcription: Option<String>,

    /// Heavy/light sequence, one `H` or `L` per syllable
    #[serde(default)]
    pub rhythm_sequence: String,

    #[serde(default, alias = "transitions")]
    pub transition_groups: TransitionGroups,
}

impl NameEntry {
    /// Create a minimal entry; metrics stay at their defaults until derived.
    pub fn new(display: impl Into<String>, phonetic_transcription: impl Into<String>) -> Self {
        let display = display.into();
        Self {
            key: display.trim().to_lowercase(),
            display,
            popularity: Popularity::default(),
            metrics: NameMetrics::default(),
            phonetic_transcription: phonetic_transcription.into(),
            simplified_transcription: None,
            rhythm_sequence: String::new(),
            transition_groups: TransitionGroups::default(),
        }
    }

    pub fn with_popularity(mut self, count: u64) -> Self {
        self.popularity = Popularity::Count(count);
        self
    }

    pub fn with_transitions(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.transition_groups = TransitionGroups {
            start: Some(start.into()),
            end: Some(end.into()),
        };
        self
    }

    /// Display form, falling back to the key.
    pub fn display_name(&self) -> &str {
        if self.display.is_empty() {
            &self.key
        } else {
            &self.display
        }
    }
}

/// Output of pairing a first name with a last name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub first_key: String,
    pub last_key: String,

    /// Signed per-component scores in [-1, 1]
    pub components: BTreeMap<ComponentKey, f64>,

    /// Weighted sum before clamping
    pub weighted_sum: f64,

    /// Final compatibility in [0, 1], rounded
    pub normalized: f64,
}

impl ScoredPair {
    pub fn component(&self, key: ComponentKey) -> Option<f64> {
        self.components.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_key_from_str() {
        assert_eq!("vowel_location".parse::<ComponentKey>().unwrap(), ComponentKey::VowelLocation);
        assert_eq!("vowel_openness".parse::<ComponentKey>().unwrap(), ComponentKey::VowelOpenness);
        assert_eq!("vowel_openess".parse::<ComponentKey>().unwrap(), ComponentKey::VowelOpenness);
        assert_eq!(
            "junction_transition".parse::<ComponentKey>().unwrap(),
            ComponentKey::EndStartTransition
        );
        assert!("syllables".parse::<ComponentKey>().is_err());
    }

    #[test]
    fn test_component_key_index_matches_all() {
        for (i, key) in ComponentKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_entry_deserialization() {
        let json = r#"{
            "name": "aino",
            "display": "Aino",
            "popularity": {"total": 12000, "by_gender": {"female": 12000}},
            "metrics": {"front_ratio": 0.0, "back_ratio": 0.67, "length": 4, "syllables": 2},
            "phonetic_transcription": "ai-no",
            "transitions": {"start": "a", "end": "o"}
        }"#;
        let entry: NameEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.key, "aino");
        assert_eq!(entry.popularity.total(), 12000);
        assert_eq!(entry.metrics.soft_ratio, 0.5);
        assert_eq!(entry.transition_groups.start.as_deref(), Some("a"));
    }

    #[test]
    fn test_surname_popularity_is_plain_count() {
        let json = r#"{"name": "virtanen", "popularity": 22000}"#;
        let entry: NameEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.popularity.total(), 22000);
        assert_eq!(entry.display_name(), "virtanen");
    }

    #[test]
    fn test_scored_pair_serializes_component_names() {
        let mut components = BTreeMap::new();
        components.insert(ComponentKey::VowelOpenness, 0.25);
        let pair = ScoredPair {
            first_key: "aino".into(),
            last_key: "virtanen".into(),
            components,
            weighted_sum: 0.1,
            normalized: 0.55,
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"vowel_openess\":0.25"));
    }
}
