//! Signed component weights.
//!
//! A `WeightVector` can only be obtained through `WeightVectorBuilder`,
//! which enforces the absolute-weight budget at construction time. The
//! all-zero `Default` is the one exception and scores every pair 0.5.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ComponentKey, StatisticalModel};

/// Target value of `Σ|weight|`.
pub const WEIGHT_BUDGET: f64 = 1.0;

/// Accepted deviation from the budget for caller-supplied vectors.
pub const WEIGHT_TOLERANCE: f64 = 5e-4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("Unknown weight component: {0}")]
    UnknownComponent(String),

    #[error("Weight for {key} is not a finite number ({value})")]
    NonFinite { key: ComponentKey, value: f64 },

    #[error("Invalid weight assignment '{0}', expected key=value")]
    InvalidAssignment(String),

    #[error("Absolute weights sum to {total:.4}, expected {budget} ± {tolerance}")]
    Budget { total: f64, budget: f64, tolerance: f64 },

    #[error("Cannot normalize a vector whose weights are all zero")]
    AllZero,
}

/// One validated scoring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct WeightVector {
    vowel_location: f64,
    #[serde(rename = "vowel_openess")]
    vowel_openness: f64,
    softness: f64,
    tone: f64,
    rhythm: f64,
    length: f64,
    alliteration: f64,
    head_transition: f64,
    end_start_transition: f64,
    oddness: f64,
}

impl WeightVector {
    /// Vector with every weight at zero.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn builder() -> WeightVectorBuilder {
        WeightVectorBuilder::new()
    }

    /// Built-in defaults used when the artifact ships none.
    pub fn system_default() -> Self {
        let mut builder = WeightVectorBuilder::new();
        for key in ComponentKey::ALL {
            let value = match key {
                ComponentKey::Alliteration => -0.05,
                ComponentKey::Oddness => -0.1,
                _ => 0.1,
            };
            builder = builder.weight(key, value);
        }
        // Non-zero constants always normalize.
        builder.normalized().unwrap_or_default()
    }

    /// Defaults carried by the artifact, or the built-in ones.
    pub fn from_model(model: &StatisticalModel) -> Self {
        let Some(map) = model.default_weights.as_ref().filter(|m| !m.is_empty()) else {
            return Self::system_default();
        };
        match WeightVectorBuilder::from_map_lenient(map).normalized() {
            Ok(weights) => weights,
            Err(err) => {
                tracing::warn!(error = %err, "Artifact default weights unusable, using built-in defaults");
                Self::system_default()
            }
        }
    }

    pub fn get(&self, key: ComponentKey) -> f64 {
        match key {
            ComponentKey::VowelLocation => self.vowel_location,
            ComponentKey::VowelOpenness => self.vowel_openness,
            ComponentKey::Softness => self.softness,
            ComponentKey::Tone => self.tone,
            ComponentKey::Rhythm => self.rhythm,
            ComponentKey::Length => self.length,
            ComponentKey::Alliteration => self.alliteration,
            ComponentKey::HeadTransition => self.head_transition,
            ComponentKey::EndStartTransition => self.end_start_transition,
            ComponentKey::Oddness => self.oddness,
        }
    }

    fn slot(&mut self, key: ComponentKey) -> &mut f64 {
        match key {
            ComponentKey::VowelLocation => &mut self.vowel_location,
            ComponentKey::VowelOpenness => &mut self.vowel_openness,
            ComponentKey::Softness => &mut self.softness,
            ComponentKey::Tone => &mut self.tone,
            ComponentKey::Rhythm => &mut self.rhythm,
            ComponentKey::Length => &mut self.length,
            ComponentKey::Alliteration => &mut self.alliteration,
            ComponentKey::HeadTransition => &mut self.head_transition,
            ComponentKey::EndStartTransition => &mut self.end_start_transition,
            ComponentKey::Oddness => &mut self.oddness,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKey, f64)> + '_ {
        ComponentKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// `Σ|weight|`
    pub fn absolute_total(&self) -> f64 {
        self.iter().map(|(_, w)| w.abs()).sum()
    }

    /// Slot-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        ComponentKey::ALL
            .iter()
            .all(|&key| (self.get(key) - other.get(key)).abs() <= tolerance)
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightVector {
    type Error = WeightError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut builder = WeightVectorBuilder::new();
        for (name, value) in map {
            builder = builder.weight(name.parse()?, value);
        }
        builder.build()
    }
}

/// Collects raw weights and validates them into a `WeightVector`.
#[derive(Debug, Clone)]
pub struct WeightVectorBuilder {
    raw: WeightVector,
}

impl Default for WeightVectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightVectorBuilder {
    pub fn new() -> Self {
        Self {
            raw: WeightVector::default(),
        }
    }

    /// Start from an existing vector, e.g. to override a few slots of the defaults.
    pub fn from_vector(weights: WeightVector) -> Self {
        Self {
            raw: weights,
        }
    }

    /// Unknown keys are logged and skipped.
    pub fn from_map_lenient(map: &BTreeMap<String, f64>) -> Self {
        let mut builder = Self::new();
        for (name, &value) in map {
            match name.parse::<ComponentKey>() {
                Ok(key) => builder = builder.weight(key, value),
                Err(_) => tracing::warn!(key = %name, "Ignoring unknown weight key"),
            }
        }
        builder
    }

    pub fn weight(mut self, key: ComponentKey, value: f64) -> Self {
        *self.raw.slot(key) = value;
        self
    }

    /// Apply a `key=value` assignment.
    pub fn assign(self, assignment: &str) -> Result<Self, WeightError> {
        let (key, value) = parse_assignment(assignment)?;
        Ok(self.weight(key, value))
    }

    fn check_finite(&self) -> Result<(), WeightError> {
        for (key, value) in self.raw.iter() {
            if !value.is_finite() {
                return Err(WeightError::NonFinite { key, value });
            }
        }
        Ok(())
    }

    /// Validate a caller-supplied vector: every slot finite and
    /// `Σ|weight|` within tolerance of the budget. The accepted vector is
    /// rescaled onto the budget exactly.
    pub fn build(self) -> Result<WeightVector, WeightError> {
        self.check_finite()?;
        let total = self.raw.absolute_total();
        if (total - WEIGHT_BUDGET).abs() > WEIGHT_TOLERANCE {
            return Err(WeightError::Budget {
                total,
                budget: WEIGHT_BUDGET,
                tolerance: WEIGHT_TOLERANCE,
            });
        }
        Ok(scale(self.raw, WEIGHT_BUDGET / total))
    }

    /// Scale any finite, non-zero vector onto the budget.
    pub fn normalized(self) -> Result<WeightVector, WeightError> {
        self.check_finite()?;
        let total = self.raw.absolute_total();
        if total == 0.0 {
            return Err(WeightError::AllZero);
        }
        Ok(scale(self.raw, WEIGHT_BUDGET / total))
    }
}

fn scale(mut weights: WeightVector, factor: f64) -> WeightVector {
    for key in ComponentKey::ALL {
        *weights.slot(key) *= factor;
    }
    weights
}

/// Parse `vowel_location=0.25`.
pub fn parse_assignment(assignment: &str) -> Result<(ComponentKey, f64), WeightError> {
    let (key, value) = assignment
        .split_once(['=', ':'])
        .ok_or_else(|| WeightError::InvalidAssignment(assignment.to_string()))?;
    let key: ComponentKey = key.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| WeightError::InvalidAssignment(assignment.to_string()))?;
    Ok((key, value))
}
