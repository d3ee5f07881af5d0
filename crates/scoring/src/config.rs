use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most decimal places an `f64` score can carry.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite value in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("Blend weights must be finite, non-negative and not both zero (whole {whole}, edge {edge})")]
    EdgeBlend { whole: f64, edge: f64 },

    #[error("Oddness floor {floor} lies above ceiling {ceiling}")]
    OddnessRamp { floor: u64, ceiling: u64 },

    #[error("Precision {0} exceeds 15 decimal places")]
    Precision(u32),
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

/// Constants of the component and pair scorers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Compression of table scores toward 0.5
    pub stability_factor: f64,
    /// Weight of the whole-name score when blending with the edge score
    pub whole_weight: f64,
    /// Weight of the boundary-syllable score
    pub edge_weight: f64,
    /// Share of the syllable score in the combined length value
    pub syllable_share: f64,
    /// Bearer count at or below which a first name is fully rare
    pub oddness_floor: u64,
    /// Bearer count at or above which a first name is fully common
    pub oddness_ceiling: u64,
    /// Decimal places of the normalized score
    pub precision: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stability_factor: 0.7,
            whole_weight: 2.0,
            edge_weight: 1.0,
            syllable_share: 0.7,
            oddness_floor: 200,
            oddness_ceiling: 1000,
            precision: 3,
        }
    }
}

impl ScoringConfig {
    /// Reject settings that would push scores outside their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("stability_factor", self.stability_factor)?;
        unit_range("syllable_share", self.syllable_share)?;
        let (whole, edge) = (self.whole_weight, self.edge_weight);
        if !whole.is_finite() || !edge.is_finite() || whole < 0.0 || edge < 0.0 || whole + edge == 0.0 {
            return Err(ConfigError::EdgeBlend { whole, edge });
        }
        if self.oddness_floor > self.oddness_ceiling {
            return Err(ConfigError::OddnessRamp {
                floor: self.oddness_floor,
                ceiling: self.oddness_ceiling,
            });
        }
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::Precision(self.precision));
        }
        Ok(())
    }

    /// `0.5 + (score - 0.5) × factor`
    pub fn stabilize(&self, score: f64) -> f64 {
        0.5 + (score - 0.5) * self.stability_factor
    }

    pub fn blend_edge(&self, whole: f64, edge: f64) -> f64 {
        (self.whole_weight * whole + self.edge_weight * edge) / (self.whole_weight + self.edge_weight)
    }

    pub fn blend_length(&self, syllables: f64, length: f64) -> f64 {
        self.syllable_share * syllables + (1.0 - self.syllable_share) * length
    }

    /// Rarity penalty in [0, 1]: 1 at or below the floor, falling
    /// linearly to 0 at the ceiling.
    pub fn oddness_penalty(&self, bearers: u64) -> f64 {
        if bearers <= self.oddness_floor {
            1.0
        } else if bearers < self.oddness_ceiling {
            (self.oddness_ceiling - bearers) as f64 / (self.oddness_ceiling - self.oddness_floor) as f64
        } else {
            0.0
        }
    }

    /// Round to `precision` decimals, at most `MAX_PRECISION`.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.precision.min(MAX_PRECISION) as i32);
        (value * scale).round() / scale
    }
}
