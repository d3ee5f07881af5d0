//! Per-name feature derivation, computed once at load time.

use nimipari_model::{NameEntry, NameMetrics};
use serde::Serialize;

use crate::buckets::{
    rhythm_bucket, BucketConfig, LengthBucket, PhonemeBuckets, SyllableBucket,
};
use crate::phoneme::{rhythm_code, simplified_initial, split_syllables, weight_sequence, PhonemeProfile};

impl From<&NameMetrics> for PhonemeProfile {
    fn from(m: &NameMetrics) -> Self {
        Self {
            front_ratio: m.front_ratio,
            back_ratio: m.back_ratio,
            open_ratio: m.open_ratio,
            close_ratio: m.close_ratio,
            soft_ratio: m.soft_ratio,
            valence: m.valence,
            ..Default::default()
        }
    }
}

/// Letters in the written form of a name.
pub fn letter_count(text: &str) -> u32 {
    text.chars().filter(|c| c.is_alphabetic()).count() as u32
}

/// Whole-name metrics derived from a syllabified transcription.
pub fn derive_metrics(transcription: &str, written: &str) -> NameMetrics {
    let syllables = split_syllables(transcription);
    let whole = PhonemeProfile::of(&syllables.concat());
    NameMetrics {
        front_ratio: whole.front_ratio,
        back_ratio: whole.back_ratio,
        open_ratio: whole.open_ratio,
        close_ratio: whole.close_ratio,
        soft_ratio: whole.soft_ratio,
        valence: whole.valence,
        length: letter_count(written),
        syllables: syllables.len() as u32,
    }
}

/// Bring `metrics` and `rhythm_sequence` in line with the transcription.
///
/// Entries without a transcription keep the metrics they were delivered
/// with; only a missing letter count is filled in.
pub fn prepare_entry(entry: &mut NameEntry) {
    if entry.phonetic_transcription.trim().is_empty() {
        if entry.metrics.length == 0 {
            entry.metrics.length = letter_count(entry.display_name());
        }
        return;
    }
    entry.metrics = derive_metrics(&entry.phonetic_transcription, entry.display_name());
    entry.rhythm_sequence = weight_sequence(&entry.phonetic_transcription);
}

fn non_empty(group: &Option<String>) -> Option<String> {
    group.as_deref().map(str::trim).filter(|g| !g.is_empty()).map(str::to_string)
}

/// Everything pair scoring needs from one name, precomputed.
#[derive(Debug, Clone, Serialize)]
pub struct NameProfile {
    pub key: String,
    pub display: String,
    /// Bearer count
    pub popularity: u64,
    #[serde(skip)]
    pub whole: PhonemeBuckets,
    /// Buckets of the first syllable
    #[serde(skip)]
    pub head: PhonemeBuckets,
    /// Buckets of the last syllable
    #[serde(skip)]
    pub tail: PhonemeBuckets,
    pub length: LengthBucket,
    pub syllables: SyllableBucket,
    /// Full R/K sequence
    pub rhythm_code: String,
    /// Truncated R/K sequence used as a table key
    pub rhythm_bucket: String,
    pub start_group: Option<String>,
    pub end_group: Option<String>,
    /// First simplified phoneme, for alliteration
    pub initial: Option<char>,
}

impl NameProfile {
    /// Build from an entry that went through `prepare_entry`.
    pub fn new(entry: &NameEntry, config: &BucketConfig) -> Self {
        let syllables = split_syllables(&entry.phonetic_transcription);
        let head = PhonemeProfile::of(syllables.first().copied().unwrap_or_default());
        let tail = PhonemeProfile::of(syllables.last().copied().unwrap_or_default());

        let rhythm_code = rhythm_code(&entry.rhythm_sequence);
        let rhythm_bucket = rhythm_bucket(&rhythm_code, config.rhythm_prefix);

        let initial = entry
            .simplified_transcription
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| Some(entry.phonetic_transcription.as_str()).filter(|s| !s.trim().is_empty()))
            .and_then(simplified_initial)
            .or_else(|| simplified_initial(&entry.key));

        Self {
            key: entry.key.clone(),
            display: entry.display_name().to_string(),
            popularity: entry.popularity.total(),
            whole: PhonemeBuckets::from_profile(&PhonemeProfile::from(&entry.metrics), config),
            head: PhonemeBuckets::from_profile(&head, config),
            tail: PhonemeBuckets::from_profile(&tail, config),
            length: LengthBucket::classify(entry.metrics.length),
            syllables: SyllableBucket::classify(entry.metrics.syllables),
            rhythm_code,
            rhythm_bucket,
            start_group: non_empty(&entry.transition_groups.start),
            end_group: non_empty(&entry.transition_groups.end),
            initial,
        }
    }
}

/// Prepare and profile a whole pool.
pub fn build_profiles(entries: &mut [NameEntry], config: &BucketConfig) -> Vec<NameProfile> {
    entries
        .iter_mut()
        .map(|entry| {
            prepare_entry(entry);
            NameProfile::new(entry, config)
        })
        .collect()
}
