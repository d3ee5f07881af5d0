//! Discretization of phonetic features into statistical-table keys.
//!
//! Every function here is total: non-finite inputs are read as 0 and every
//! input lands in exactly one labelled bucket.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::phoneme::PhonemeProfile;

/// Thresholds for a two-sided dominance split (front/back, open/close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominanceThresholds {
    /// Minimum share for a dominant side
    pub strong: f64,
    /// Maximum share of the other side when dominant
    pub strong_other_max: f64,
    /// Minimum share for a leaning side
    pub mild: f64,
    /// Maximum share of the other side when leaning
    pub mild_other_max: f64,
    /// Both sides below this means neither is present
    pub absent_max: f64,
}

impl DominanceThresholds {
    pub const VOWEL_LOCATION: Self = Self {
        strong: 0.7,
        strong_other_max: 0.2,
        mild: 0.5,
        mild_other_max: 0.3,
        absent_max: 0.05,
    };

    pub const VOWEL_OPENNESS: Self = Self {
        strong: 0.6,
        strong_other_max: 0.2,
        mild: 0.45,
        mild_other_max: 0.35,
        absent_max: 0.05,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftnessThresholds {
    pub soft_only: f64,
    pub softish: f64,
    pub hard_only: f64,
    pub hardish: f64,
}

impl Default for SoftnessThresholds {
    fn default() -> Self {
        Self {
            soft_only: 0.8,
            softish: 0.6,
            hard_only: 0.2,
            hardish: 0.4,
        }
    }
}

/// Upper (exclusive) bounds of the first four tone buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneThresholds {
    pub very_warm: f64,
    pub warm: f64,
    pub neutral: f64,
    pub bright: f64,
}

impl Default for ToneThresholds {
    fn default() -> Self {
        Self {
            very_warm: -0.4,
            warm: -0.2,
            neutral: 0.2,
            bright: 0.4,
        }
    }
}

/// All bucket thresholds. The defaults are the constants the shipped
/// statistical tables were estimated with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub vowel_location: DominanceThresholds,
    pub vowel_openness: DominanceThresholds,
    pub softness: SoftnessThresholds,
    pub tone: ToneThresholds,
    /// Syllables kept in the rhythm bucket
    pub rhythm_prefix: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            vowel_location: DominanceThresholds::VOWEL_LOCATION,
            vowel_openness: DominanceThresholds::VOWEL_OPENNESS,
            softness: SoftnessThresholds::default(),
            tone: ToneThresholds::default(),
            rhythm_prefix: 3,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dominance {
    Absent,
    FirstDominant,
    SecondDominant,
    FirstLeaning,
    SecondLeaning,
    Mixed,
}

fn dominance(first: f64, second: f64, t: &DominanceThresholds) -> Dominance {
    let (a, b) = (finite_or_zero(first), finite_or_zero(second));
    if a < t.absent_max && b < t.absent_max {
        Dominance::Absent
    } else if a >= t.strong && b <= t.strong_other_max {
        Dominance::FirstDominant
    } else if b >= t.strong && a <= t.strong_other_max {
        Dominance::SecondDominant
    } else if a >= t.mild && b <= t.mild_other_max {
        Dominance::FirstLeaning
    } else if b >= t.mild && a <= t.mild_other_max {
        Dominance::SecondLeaning
    } else {
        Dominance::Mixed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VowelLocationBucket {
    FrontDominant,
    BackDominant,
    FrontNeutral,
    BackNeutral,
    NeutralOnly,
    Mixed,
}

impl VowelLocationBucket {
    pub const ALL: [Self; 6] = [
        Self::FrontDominant,
        Self::BackDominant,
        Self::FrontNeutral,
        Self::BackNeutral,
        Self::NeutralOnly,
        Self::Mixed,
    ];

    pub fn classify(front_ratio: f64, back_ratio: f64, t: &DominanceThresholds) -> Self {
        match dominance(front_ratio, back_ratio, t) {
            Dominance::Absent => Self::NeutralOnly,
            Dominance::FirstDominant => Self::FrontDominant,
            Dominance::SecondDominant => Self::BackDominant,
            Dominance::FirstLeaning => Self::FrontNeutral,
            Dominance::SecondLeaning => Self::BackNeutral,
            Dominance::Mixed => Self::Mixed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrontDominant => "front_dominant",
            Self::BackDominant => "back_dominant",
            Self::FrontNeutral => "front_neutral",
            Self::BackNeutral => "back_neutral",
            Self::NeutralOnly => "neutral_only",
            Self::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VowelOpennessBucket {
    OpenDominant,
    CloseDominant,
    OpenMid,
    CloseMid,
    NeutralOnly,
    Mixed,
}

impl VowelOpennessBucket {
    pub const ALL: [Self; 6] = [
        Self::OpenDominant,
        Self::CloseDominant,
        Self::OpenMid,
        Self::CloseMid,
        Self::NeutralOnly,
        Self::Mixed,
    ];

    pub fn classify(open_ratio: f64, close_ratio: f64, t: &DominanceThresholds) -> Self {
        match dominance(open_ratio, close_ratio, t) {
            Dominance::Absent => Self::NeutralOnly,
            Dominance::FirstDominant => Self::OpenDominant,
            Dominance::SecondDominant => Self::CloseDominant,
            Dominance::FirstLeaning => Self::OpenMid,
            Dominance::SecondLeaning => Self::CloseMid,
            Dominance::Mixed => Self::Mixed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenDominant => "open_dominant",
            Self::CloseDominant => "close_dominant",
            Self::OpenMid => "open_mid",
            Self::CloseMid => "close_mid",
            Self::NeutralOnly => "neutral_only",
            Self::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftnessBucket {
    SoftOnly,
    Softish,
    Balanced,
    Hardish,
    HardOnly,
}

impl SoftnessBucket {
    pub const ALL: [Self; 5] = [
        Self::SoftOnly,
        Self::Softish,
        Self::Balanced,
        Self::Hardish,
        Self::HardOnly,
    ];

    pub fn classify(soft_ratio: f64, t: &SoftnessThresholds) -> Self {
        let s = finite_or_zero(soft_ratio);
        if s >= t.soft_only {
            Self::SoftOnly
        } else if s >= t.softish {
            Self::Softish
        } else if s <= t.hard_only {
            Self::HardOnly
        } else if s <= t.hardish {
            Self::Hardish
        } else {
            Self::Balanced
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SoftOnly => "soft_only",
            Self::Softish => "softish",
            Self::Balanced => "balanced",
            Self::Hardish => "hardish",
            Self::HardOnly => "hard_only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneBucket {
    VeryWarm,
    Warm,
    Neutral,
    Bright,
    VeryBright,
}

impl ToneBucket {
    pub const ALL: [Self; 5] = [
        Self::VeryWarm,
        Self::Warm,
        Self::Neutral,
        Self::Bright,
        Self::VeryBright,
    ];

    pub fn classify(valence: f64, t: &ToneThresholds) -> Self {
        let v = finite_or_zero(valence);
        if v < t.very_warm {
            Self::VeryWarm
        } else if v < t.warm {
            Self::Warm
        } else if v < t.neutral {
            Self::Neutral
        } else if v < t.bright {
            Self::Bright
        } else {
            Self::VeryBright
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryWarm => "very_warm",
            Self::Warm => "warm",
            Self::Neutral => "neutral",
            Self::Bright => "bright",
            Self::VeryBright => "very_bright",
        }
    }
}

/// Letter-count ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthBucket {
    #[serde(rename = "3-4")]
    Short,
    #[serde(rename = "5-6")]
    Medium,
    #[serde(rename = "7-8")]
    Long,
    #[serde(rename = "9-10")]
    VeryLong,
    #[serde(rename = "11+")]
    Extreme,
}

impl LengthBucket {
    pub const ALL: [Self; 5] = [Self::Short, Self::Medium, Self::Long, Self::VeryLong, Self::Extreme];

    pub fn classify(letters: u32) -> Self {
        match letters {
            0..=4 => Self::Short,
            5..=6 => Self::Medium,
            7..=8 => Self::Long,
            9..=10 => Self::VeryLong,
            _ => Self::Extreme,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "3-4",
            Self::Medium => "5-6",
            Self::Long => "7-8",
            Self::VeryLong => "9-10",
            Self::Extreme => "11+",
        }
    }
}

/// Syllable counts 1 through 5, then 6 or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyllableBucket(u8);

impl SyllableBucket {
    pub fn classify(syllables: u32) -> Self {
        Self(syllables.clamp(1, 6) as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self.0 {
            1 => "1",
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            _ => "6+",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(
    VowelLocationBucket,
    VowelOpennessBucket,
    SoftnessBucket,
    ToneBucket,
    LengthBucket,
    SyllableBucket
);

/// The four ratio-derived buckets of one stretch of phonemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonemeBuckets {
    pub vowel_location: VowelLocationBucket,
    pub vowel_openness: VowelOpennessBucket,
    pub softness: SoftnessBucket,
    pub tone: ToneBucket,
}

impl PhonemeBuckets {
    pub fn from_profile(profile: &PhonemeProfile, config: &BucketConfig) -> Self {
        Self {
            vowel_location: VowelLocationBucket::classify(
                profile.front_ratio,
                profile.back_ratio,
                &config.vowel_location,
            ),
            vowel_openness: VowelOpennessBucket::classify(
                profile.open_ratio,
                profile.close_ratio,
                &config.vowel_openness,
            ),
            softness: SoftnessBucket::classify(profile.soft_ratio, &config.softness),
            tone: ToneBucket::classify(profile.valence, &config.tone),
        }
    }
}

/// Leading `prefix` syllables of an R/K rhythm code.
pub fn rhythm_bucket(code: &str, prefix: usize) -> String {
    code.chars().take(prefix).collect()
}
