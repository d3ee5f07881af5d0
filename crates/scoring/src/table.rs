//! Statistical table lookup.
//!
//! Rows are min-max normalized once when the model is compiled, so a
//! lookup during a scan is two hash probes.

use std::collections::HashMap;

use nimipari_model::{Distribution, StatisticalModel, TableComponent, DEFAULT_ROW};

use crate::config::ScoringConfig;

/// Score returned when a row carries no information.
pub const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone)]
struct NormalizedRow {
    scores: HashMap<String, f64>,
    /// Score of an observation missing from the row
    missing: f64,
}

impl NormalizedRow {
    fn compile(dist: &Distribution) -> Self {
        if dist.is_empty() {
            return Self {
                scores: HashMap::new(),
                missing: NEUTRAL_SCORE,
            };
        }

        let min = dist.values().copied().fold(f64::INFINITY, f64::min);
        let max = dist.values().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == min {
            return Self {
                scores: HashMap::new(),
                missing: NEUTRAL_SCORE,
            };
        }

        let span = max - min;
        let scores = dist
            .iter()
            .map(|(bucket, &p)| (bucket.clone(), ((p - min) / span).clamp(0.0, 1.0)))
            .collect();
        // A missing observation reads as the row minimum.
        Self { scores, missing: 0.0 }
    }

    fn score(&self, obs: &str) -> f64 {
        self.scores.get(obs).copied().unwrap_or(self.missing)
    }
}

#[derive(Debug, Clone)]
struct CompiledTable {
    rows: HashMap<String, NormalizedRow>,
    default_row: Option<NormalizedRow>,
}

impl CompiledTable {
    fn compile(table: &nimipari_model::ConditionalTable) -> Self {
        let mut rows = HashMap::with_capacity(table.len());
        let mut default_row = None;
        for (cond, dist) in table {
            let row = NormalizedRow::compile(dist);
            if cond == DEFAULT_ROW {
                default_row = Some(row);
            } else {
                rows.insert(cond.clone(), row);
            }
        }
        Self { rows, default_row }
    }

    fn lookup(&self, obs: &str, cond: &str) -> f64 {
        match self.rows.get(cond).or(self.default_row.as_ref()) {
            Some(row) => row.score(obs),
            None => NEUTRAL_SCORE,
        }
    }
}

/// A validated `StatisticalModel` prepared for fast lookups.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    tables: [Option<CompiledTable>; TableComponent::COUNT],
    source: StatisticalModel,
}

impl CompiledModel {
    /// Compile an artifact that already passed `StatisticalModel::validate`.
    pub fn compile(source: StatisticalModel) -> Self {
        let tables = std::array::from_fn(|i| source.table(TableComponent::ALL[i]).map(CompiledTable::compile));
        let compiled = Self { tables, source };
        tracing::debug!(
            tables = compiled.tables.iter().filter(|t| t.is_some()).count(),
            "Compiled statistical tables"
        );
        compiled
    }

    pub fn has_table(&self, component: TableComponent) -> bool {
        self.tables[component.index()].is_some()
    }

    /// The artifact this model was compiled from.
    pub fn source(&self) -> &StatisticalModel {
        &self.source
    }

    /// Min-max normalized probability of `obs` given `cond`, in [0, 1].
    ///
    /// Falls back to the `_default` row when `cond` has none, and to 0.5
    /// when neither exists or the row is flat.
    pub fn lookup(&self, component: TableComponent, obs: &str, cond: &str) -> f64 {
        match &self.tables[component.index()] {
            Some(table) => table.lookup(obs, cond),
            None => NEUTRAL_SCORE,
        }
    }

    /// `lookup` followed by stability dampening.
    pub fn score_component(
        &self,
        component: TableComponent,
        obs: &str,
        cond: &str,
        config: &ScoringConfig,
    ) -> f64 {
        config.stabilize(self.lookup(component, obs, cond))
    }
}

/// Signed deviation of a conditional probability from its baseline:
/// `tanh(ln((p + ε) / (base + ε)))`, in [-1, 1].
pub fn prob_to_score(prob: f64, base: f64) -> f64 {
    const EPS: f64 = 1e-9;
    let ratio = (prob + EPS) / (base + EPS);
    ratio.ln().tanh().clamp(-1.0, 1.0)
}

/// Map a [0, 1] score onto [-1, 1]. Non-finite input maps to 0.
pub fn to_signed(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 2.0 - 1.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn model_with(component: &str, rows: &[(&str, &[(&str, f64)])]) -> StatisticalModel {
        let mut model = StatisticalModel::default();
        let table = rows
            .iter()
            .map(|(cond, dist)| {
                let dist: BTreeMap<String, f64> = dist.iter().map(|(k, v)| (k.to_string(), *v)).collect();
                (cond.to_string(), dist)
            })
            .collect();
        model.tables.insert(component.to_string(), table);
        model
    }

    #[test]
    fn test_lookup_min_max_normalizes() {
        let model = CompiledModel::compile(model_with(
            "tone",
            &[("warm", &[("warm", 0.6), ("neutral", 0.3), ("bright", 0.1)])],
        ));
        assert_eq!(model.lookup(TableComponent::Tone, "warm", "warm"), 1.0);
        assert_eq!(model.lookup(TableComponent::Tone, "bright", "warm"), 0.0);
        assert!((model.lookup(TableComponent::Tone, "neutral", "warm") - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_missing_observation_reads_as_minimum() {
        let model = CompiledModel::compile(model_with("tone", &[("warm", &[("warm", 0.6), ("neutral", 0.3)])]));
        assert_eq!(model.lookup(TableComponent::Tone, "very_bright", "warm"), 0.0);
    }

    #[test]
    fn test_missing_row_uses_default_then_neutral() {
        let with_default = CompiledModel::compile(model_with(
            "tone",
            &[("_default", &[("warm", 0.2), ("bright", 0.8)])],
        ));
        assert_eq!(with_default.lookup(TableComponent::Tone, "bright", "unknown"), 1.0);

        let without = CompiledModel::compile(model_with("tone", &[("warm", &[("warm", 0.2), ("bright", 0.8)])]));
        assert_eq!(without.lookup(TableComponent::Tone, "bright", "unknown"), NEUTRAL_SCORE);
        assert_eq!(without.lookup(TableComponent::Softness, "x", "y"), NEUTRAL_SCORE);
    }

    #[test]
    fn test_flat_and_empty_rows_are_neutral() {
        let model = CompiledModel::compile(model_with(
            "tone",
            &[("warm", &[("warm", 0.3), ("bright", 0.3)]), ("bright", &[])],
        ));
        assert_eq!(model.lookup(TableComponent::Tone, "warm", "warm"), NEUTRAL_SCORE);
        assert_eq!(model.lookup(TableComponent::Tone, "warm", "bright"), NEUTRAL_SCORE);
    }

    #[test]
    fn test_score_component_is_dampened() {
        let model = CompiledModel::compile(model_with("tone", &[("warm", &[("warm", 0.6), ("bright", 0.1)])]));
        let config = ScoringConfig::default();
        let score = model.score_component(TableComponent::Tone, "warm", "warm", &config);
        assert!((score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_prob_to_score() {
        assert!(prob_to_score(0.2, 0.2).abs() < 1e-9);
        assert!(prob_to_score(0.8, 0.2) > 0.8);
        assert!(prob_to_score(0.0, 0.5) <= -0.99);
    }

    #[test]
    fn test_to_signed() {
        assert_eq!(to_signed(0.0), -1.0);
        assert_eq!(to_signed(1.0), 1.0);
        assert_eq!(to_signed(0.5), 0.0);
        assert_eq!(to_signed(f64::NAN), 0.0);
    }
}
