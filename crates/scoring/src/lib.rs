//! Compatibility scoring for first-name/last-name pairs.
//!
//! Takes precomputed `NameProfile`s and a compiled statistical model and
//! produces per-component scores plus one weighted, normalized
//! compatibility value per pair.

pub mod config;
pub mod pair;
pub mod table;

pub use config::{ConfigError, ScoringConfig, MAX_PRECISION};
pub use pair::{component_scores, compute_pair_score, ComponentScores, PairScorer};
pub use table::{prob_to_score, to_signed, CompiledModel, NEUTRAL_SCORE};
