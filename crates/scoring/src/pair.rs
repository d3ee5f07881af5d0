//! Pair scoring: one first name evaluated against one last name.
//!
//! The model is directional. Table lookups observe the first name's
//! bucket conditioned on the last name's bucket.

use std::collections::BTreeMap;

use nimipari_features::{rhythm_similarity, NameProfile, PhonemeBuckets};
use nimipari_model::{ComponentKey, ScoredPair, TableComponent, WeightVector};

use crate::config::ScoringConfig;
use crate::table::{to_signed, CompiledModel};

/// Signed component scores of one pair, indexed by `ComponentKey`.
///
/// Absent slots belong to components the model cannot score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentScores([Option<f64>; ComponentKey::COUNT]);

impl ComponentScores {
    pub fn get(&self, key: ComponentKey) -> Option<f64> {
        self.0[key.index()]
    }

    fn set(&mut self, key: ComponentKey, value: Option<f64>) {
        self.0[key.index()] = value.map(|v| v.clamp(-1.0, 1.0));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKey, f64)> + '_ {
        ComponentKey::ALL
            .iter()
            .filter_map(|&key| self.get(key).map(|score| (key, score)))
    }

    /// `Σ weight × score` over the components that are present.
    pub fn weighted_sum(&self, weights: &WeightVector) -> f64 {
        self.iter().map(|(key, score)| weights.get(key) * score).sum()
    }

    pub fn to_map(&self) -> BTreeMap<ComponentKey, f64> {
        self.iter().collect()
    }
}

fn table_score(
    model: &CompiledModel,
    component: TableComponent,
    obs: Option<&str>,
    cond: Option<&str>,
    config: &ScoringConfig,
) -> Option<f64> {
    if !model.has_table(component) {
        return None;
    }
    // A side without a label reads as the least favorable score.
    let raw = match (obs, cond) {
        (Some(obs), Some(cond)) => model.lookup(component, obs, cond),
        _ => 0.0,
    };
    Some(config.stabilize(raw))
}

/// Whole-name score blended with the boundary-syllable score when the
/// model carries the edge table.
fn edge_blended(
    model: &CompiledModel,
    component: TableComponent,
    label: fn(&PhonemeBuckets) -> &'static str,
    first: &NameProfile,
    last: &NameProfile,
    config: &ScoringConfig,
) -> Option<f64> {
    let whole = table_score(model, component, Some(label(&first.whole)), Some(label(&last.whole)), config)?;
    let edge = component
        .edge_variant()
        .and_then(|edge| table_score(model, edge, Some(label(&first.tail)), Some(label(&last.head)), config));
    Some(match edge {
        Some(edge) => config.blend_edge(whole, edge),
        None => whole,
    })
}

/// Score every component of a pair.
pub fn component_scores(
    first: &NameProfile,
    last: &NameProfile,
    model: &CompiledModel,
    config: &ScoringConfig,
) -> ComponentScores {
    let mut scores = ComponentScores::default();

    let edged: [(ComponentKey, TableComponent, fn(&PhonemeBuckets) -> &'static str); 4] = [
        (ComponentKey::VowelLocation, TableComponent::VowelLocation, |b: &PhonemeBuckets| b.vowel_location.as_str()),
        (ComponentKey::VowelOpenness, TableComponent::VowelOpenness, |b: &PhonemeBuckets| b.vowel_openness.as_str()),
        (ComponentKey::Softness, TableComponent::Softness, |b: &PhonemeBuckets| b.softness.as_str()),
        (ComponentKey::Tone, TableComponent::Tone, |b: &PhonemeBuckets| b.tone.as_str()),
    ];
    for (key, component, label) in edged {
        let score = edge_blended(model, component, label, first, last, config);
        scores.set(key, score.map(to_signed));
    }

    if !first.rhythm_code.is_empty() || !last.rhythm_code.is_empty() {
        let similarity = rhythm_similarity(&first.rhythm_code, &last.rhythm_code);
        scores.set(ComponentKey::Rhythm, Some(to_signed(similarity)));
    }

    let length = table_score(
        model,
        TableComponent::Length,
        Some(first.length.as_str()),
        Some(last.length.as_str()),
        config,
    );
    let syllables = table_score(
        model,
        TableComponent::Syllables,
        Some(first.syllables.as_str()),
        Some(last.syllables.as_str()),
        config,
    );
    let length = match (syllables, length) {
        (Some(syllables), Some(length)) => Some(config.blend_length(syllables, length)),
        (_, length) => length,
    };
    scores.set(ComponentKey::Length, length.map(to_signed));

    let head = table_score(
        model,
        TableComponent::HeadTransition,
        first.start_group.as_deref(),
        last.start_group.as_deref(),
        config,
    );
    scores.set(ComponentKey::HeadTransition, head.map(to_signed));

    let junction = table_score(
        model,
        TableComponent::EndStartTransition,
        first.end_group.as_deref(),
        last.start_group.as_deref(),
        config,
    );
    scores.set(ComponentKey::EndStartTransition, junction.map(to_signed));

    let alliteration = match (first.initial, last.initial) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => -1.0,
    };
    scores.set(ComponentKey::Alliteration, Some(alliteration));

    let penalty = config.oddness_penalty(first.popularity);
    scores.set(ComponentKey::Oddness, Some(penalty * 2.0 - 1.0));

    scores
}

/// Scores pairs against a fixed model, weight vector and configuration.
#[derive(Debug, Clone, Copy)]
pub struct PairScorer<'a> {
    model: &'a CompiledModel,
    weights: WeightVector,
    config: ScoringConfig,
}

impl<'a> PairScorer<'a> {
    pub fn new(model: &'a CompiledModel, weights: WeightVector, config: ScoringConfig) -> Self {
        Self {
            model,
            weights,
            config,
        }
    }

    pub fn components(&self, first: &NameProfile, last: &NameProfile) -> ComponentScores {
        component_scores(first, last, self.model, &self.config)
    }

    /// Final compatibility only. Used by scans, where the breakdown of all
    /// but the winners is thrown away.
    pub fn normalized(&self, first: &NameProfile, last: &NameProfile) -> f64 {
        let sum = self.components(first, last).weighted_sum(&self.weights);
        self.normalize(sum)
    }

    pub fn score(&self, first: &NameProfile, last: &NameProfile) -> ScoredPair {
        let components = self.components(first, last);
        let weighted_sum = components.weighted_sum(&self.weights);
        ScoredPair {
            first_key: first.key.clone(),
            last_key: last.key.clone(),
            components: components.to_map(),
            weighted_sum,
            normalized: self.normalize(weighted_sum),
        }
    }

    fn normalize(&self, weighted_sum: f64) -> f64 {
        let clamped = if weighted_sum.is_finite() {
            weighted_sum.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.config.round((clamped + 1.0) / 2.0)
    }
}

/// Score one pair with full component breakdown.
pub fn compute_pair_score(
    first: &NameProfile,
    last: &NameProfile,
    weights: &WeightVector,
    model: &CompiledModel,
    config: &ScoringConfig,
) -> ScoredPair {
    PairScorer::new(model, *weights, *config).score(first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimipari_features::BucketConfig;
    use nimipari_model::{NameEntry, StatisticalModel};
    use pretty_assertions::assert_eq;

    const MODEL_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/model.json"));

    fn model() -> CompiledModel {
        CompiledModel::compile(StatisticalModel::from_json_str(MODEL_JSON).unwrap())
    }

    fn profile(entry: NameEntry) -> NameProfile {
        let mut entry = entry;
        nimipari_features::prepare_entry(&mut entry);
        NameProfile::new(&entry, &BucketConfig::default())
    }

    fn with_ratios(name: &str, front: f64, back: f64) -> NameProfile {
        let mut entry = NameEntry::new(name, "");
        entry.metrics.front_ratio = front;
        entry.metrics.back_ratio = back;
        profile(entry)
    }

    fn only(key: ComponentKey) -> WeightVector {
        WeightVector::builder().weight(key, 1.0).build().unwrap()
    }

    #[test]
    fn test_pair_score_is_deterministic() {
        let model = model();
        let weights = WeightVector::from_model(model.source());
        let config = ScoringConfig::default();
        let first = profile(NameEntry::new("Kristian", "kris-ti-ɑn").with_transitions("k", "n"));
        let last = profile(NameEntry::new("Korhonen", "kor-ho-nen").with_transitions("k", "n"));

        let a = compute_pair_score(&first, &last, &weights, &model, &config);
        let b = compute_pair_score(&first, &last, &weights, &model, &config);
        assert_eq!(a, b);
        assert_eq!(a.weighted_sum.to_bits(), b.weighted_sum.to_bits());
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let model = model();
        let weights = WeightVector::system_default();
        let scorer = PairScorer::new(&model, weights, ScoringConfig::default());
        let names = [
            profile(NameEntry::new("Aino", "ɑi-no").with_popularity(40_000)),
            profile(NameEntry::new("Väinö", "væi-nø").with_transitions("v", "o")),
            profile(NameEntry::new("Laaksonen", "lɑːk-so-nen").with_transitions("l", "n")),
            profile(NameEntry::new("X", "")),
        ];
        for first in &names {
            for last in &names {
                let pair = scorer.score(first, last);
                assert!((0.0..=1.0).contains(&pair.normalized));
                for (_, score) in &pair.components {
                    assert!((-1.0..=1.0).contains(score));
                }
                assert_eq!(pair.normalized, scorer.normalized(first, last));
            }
        }
    }

    #[test]
    fn test_zero_weights_are_neutral() {
        let model = model();
        let first = profile(NameEntry::new("Aino", "ɑi-no"));
        let last = profile(NameEntry::new("Salo", "sɑ-lo"));
        let pair = compute_pair_score(&first, &last, &WeightVector::neutral(), &model, &ScoringConfig::default());
        assert_eq!(pair.weighted_sum, 0.0);
        assert_eq!(pair.normalized, 0.5);
    }

    #[test]
    fn test_self_pairing() {
        let model = model();
        let name = profile(NameEntry::new("Salo", "sɑ-lo").with_transitions("s", "o"));
        let weights = WeightVector::system_default();
        let a = compute_pair_score(&name, &name, &weights, &model, &ScoringConfig::default());
        let b = compute_pair_score(&name, &name, &weights, &model, &ScoringConfig::default());
        assert_eq!(a.normalized, b.normalized);
        assert_eq!(a.component(ComponentKey::Alliteration), Some(1.0));
        assert_eq!(a.component(ComponentKey::Rhythm), Some(1.0));
    }

    #[test]
    fn test_alliteration_both_branches() {
        let model = model();
        let config = ScoringConfig::default();
        let kristian = profile(NameEntry::new("Kristian", "kris-ti-ɑn"));
        let korhonen = profile(NameEntry::new("Korhonen", "kor-ho-nen"));
        let salo = profile(NameEntry::new("Salo", "sɑ-lo"));

        let scores = component_scores(&kristian, &korhonen, &model, &config);
        assert_eq!(scores.get(ComponentKey::Alliteration), Some(1.0));
        let scores = component_scores(&kristian, &salo, &model, &config);
        assert_eq!(scores.get(ComponentKey::Alliteration), Some(-1.0));
    }

    #[test]
    fn test_oddness_heuristic_boundaries() {
        let model = model();
        let config = ScoringConfig::default();
        let last = profile(NameEntry::new("Salo", "sɑ-lo"));
        let oddness = |count: u64| {
            let first = profile(NameEntry::new("Aino", "ɑi-no").with_popularity(count));
            component_scores(&first, &last, &model, &config)
                .get(ComponentKey::Oddness)
                .unwrap()
        };
        assert_eq!(oddness(200), 1.0);
        assert_eq!(oddness(600), 0.0);
        assert_eq!(oddness(1000), -1.0);
        assert_eq!(oddness(25_000), -1.0);
    }

    #[test]
    fn test_opposite_vowel_location_scores_low() {
        let model = model();
        let first = with_ratios("Front", 0.8, 0.0);
        let last = with_ratios("Back", 0.0, 0.8);
        let pair = compute_pair_score(
            &first,
            &last,
            &only(ComponentKey::VowelLocation),
            &model,
            &ScoringConfig::default(),
        );
        assert!(pair.normalized < 0.3, "normalized = {}", pair.normalized);
    }

    #[test]
    fn test_missing_transition_group_is_least_favorable() {
        let model = model();
        let config = ScoringConfig::default();
        let first = profile(NameEntry::new("Aino", "ɑi-no"));
        let last = profile(NameEntry::new("Salo", "sɑ-lo").with_transitions("s", "o"));
        let scores = component_scores(&first, &last, &model, &config);
        // stabilized 0.15, signed -0.7
        let head = scores.get(ComponentKey::HeadTransition).unwrap();
        assert!((head + 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_rhythm_absent_without_codes() {
        let model = model();
        let a = profile(NameEntry::new("A", ""));
        let b = profile(NameEntry::new("B", ""));
        let scores = component_scores(&a, &b, &model, &ScoringConfig::default());
        assert_eq!(scores.get(ComponentKey::Rhythm), None);
    }

    #[test]
    fn test_components_absent_without_tables() {
        let mut source = StatisticalModel::from_json_str(MODEL_JSON).unwrap();
        source.tables.remove("tone");
        let model = CompiledModel::compile(source);
        let a = profile(NameEntry::new("Aino", "ɑi-no"));
        let scores = component_scores(&a, &a, &model, &ScoringConfig::default());
        assert_eq!(scores.get(ComponentKey::Tone), None);
        assert!(scores.get(ComponentKey::Softness).is_some());
    }

    #[test]
    fn test_edge_blend_applies_with_edge_table() {
        let config = ScoringConfig::default();
        let full = model();
        let mut source = StatisticalModel::from_json_str(MODEL_JSON).unwrap();
        source.tables.remove("edge_softness");
        let whole_only = CompiledModel::compile(source);

        let first = profile(NameEntry::new("Väinö", "væi-nø"));
        let last = profile(NameEntry::new("Salo", "sɑ-lo"));
        let blended = component_scores(&first, &last, &full, &config).get(ComponentKey::Softness);
        let whole = component_scores(&first, &last, &whole_only, &config).get(ComponentKey::Softness);
        assert!(blended.is_some() && whole.is_some());
        assert_ne!(blended, whole);
    }
}
