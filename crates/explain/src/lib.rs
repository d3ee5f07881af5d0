//! Explanation generation for name-pair scores.
//!
//! Converts scored pairs into human-readable breakdowns and derives
//! per-name partner hints from the statistical tables.

pub mod hints;

use nimipari_model::{ComponentKey, ScoredPair, WeightVector};
use serde::{Deserialize, Serialize};

pub use hints::{component_label, describe_bucket, format_letters, name_hints, BucketHint, NameHint, PartnerBucket, Role};

/// A structured explanation of one pair's score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// Normalized compatibility (0.0 - 1.0)
    pub strength: f64,

    /// Per-component evidence, largest contribution first
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Component key
    pub kind: String,

    /// Signed contribution to the weighted sum
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// How much one component moved the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub component: ComponentKey,
    /// Signed component score
    pub score: f64,
    pub weight: f64,
    /// `weight × score`
    pub contribution: f64,
}

/// Weighted components of a pair, largest magnitude first. Components
/// with zero weight are left out.
pub fn contributions(pair: &ScoredPair, weights: &WeightVector) -> Vec<Contribution> {
    let mut items: Vec<Contribution> = pair
        .components
        .iter()
        .filter_map(|(&component, &score)| {
            let weight = weights.get(component);
            (weight != 0.0).then_some(Contribution {
                component,
                score,
                weight,
                contribution: weight * score,
            })
        })
        .collect();
    items.sort_by(|a, b| {
        b.contribution
            .abs()
            .total_cmp(&a.contribution.abs())
            .then(a.component.cmp(&b.component))
    });
    items
}

fn match_level(normalized: f64) -> &'static str {
    if normalized >= 0.65 {
        "STRONG MATCH"
    } else if normalized >= 0.5 {
        "GOOD MATCH"
    } else if normalized >= 0.35 {
        "WEAK MATCH"
    } else {
        "POOR MATCH"
    }
}

/// One-line verdict naming the components that helped most.
pub fn summarize_pair(pair: &ScoredPair, weights: &WeightVector) -> String {
    let helped: Vec<&str> = contributions(pair, weights)
        .iter()
        .filter(|c| c.contribution > 0.0)
        .take(3)
        .map(|c| c.component.label())
        .collect();
    if helped.is_empty() {
        format!("{}: nothing in particular carries this pair", match_level(pair.normalized))
    } else {
        format!("{}: {}", match_level(pair.normalized), helped.join(", "))
    }
}

/// Full breakdown of a scored pair.
pub fn explain_pair(pair: &ScoredPair, weights: &WeightVector) -> Explanation {
    let items = contributions(pair, weights);
    let strongest_drag = items.iter().find(|c| c.contribution < 0.0);

    let mut detail = format!(
        "'{}' with '{}' scores {:.3} (weighted sum {:+.3}).",
        pair.first_key, pair.last_key, pair.normalized, pair.weighted_sum
    );
    if let Some(drag) = strongest_drag {
        detail.push_str(&format!(" The biggest drag is {}.", drag.component.label().to_lowercase()));
    }

    Explanation {
        summary: summarize_pair(pair, weights),
        detail,
        strength: pair.normalized,
        evidence: items
            .iter()
            .map(|c| EvidenceItem {
                kind: c.component.as_str().to_string(),
                value: format!("{:+.3}", c.contribution),
                context: Some(format!("score {:+.2} × weight {:+.3}", c.score, c.weight)),
            })
            .collect(),
    }
}
