//! Feature extraction for name-pair scoring.
//!
//! Provides pure functions for computing the features used in scoring:
//! - Phoneme classification and per-syllable ratio profiles
//! - Heavy/light syllable weights and R/K rhythm codes
//! - Bucketing of continuous features into statistical-table keys
//! - Per-name `NameProfile`s precomputed once per dataset load

pub mod buckets;
pub mod phoneme;
pub mod profile;
pub mod rhythm;

pub use buckets::{
    BucketConfig, DominanceThresholds, LengthBucket, PhonemeBuckets, SoftnessBucket, SoftnessThresholds,
    SyllableBucket, ToneBucket, ToneThresholds, VowelLocationBucket, VowelOpennessBucket,
};
pub use phoneme::PhonemeProfile;
pub use profile::{build_profiles, derive_metrics, prepare_entry, NameProfile};
pub use rhythm::{edit_distance, rhythm_similarity};
