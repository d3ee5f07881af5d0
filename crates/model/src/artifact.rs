//! The pre-trained statistical artifact.
//!
//! Loaded once per session and treated as immutable afterwards.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditioning bucket used when the partner's bucket has no row.
pub const DEFAULT_ROW: &str = "_default";

/// `obs_bucket -> probability`
pub type Distribution = BTreeMap<String, f64>;

/// `cond_bucket -> distribution`
pub type ConditionalTable = BTreeMap<String, Distribution>;

/// Errors raised while loading or validating the artifact.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model artifact contains no tables")]
    Empty,

    #[error("Model artifact is missing required table '{0}'")]
    MissingTable(&'static str),

    #[error("Invalid probability {value} in {component}[{row}][{bucket}]")]
    InvalidProbability {
        component: String,
        row: String,
        bucket: String,
        value: f64,
    },
}

/// Names of the tables an artifact may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableComponent {
    VowelLocation,
    VowelOpenness,
    Softness,
    Tone,
    Rhythm,
    Length,
    Syllables,
    HeadTransition,
    EndStartTransition,
    EdgeVowelLocation,
    EdgeVowelOpenness,
    EdgeSoftness,
    EdgeTone,
}

impl TableComponent {
    pub const ALL: [TableComponent; 13] = [
        Self::VowelLocation,
        Self::VowelOpenness,
        Self::Softness,
        Self::Tone,
        Self::Rhythm,
        Self::Length,
        Self::Syllables,
        Self::HeadTransition,
        Self::EndStartTransition,
        Self::EdgeVowelLocation,
        Self::EdgeVowelOpenness,
        Self::EdgeSoftness,
        Self::EdgeTone,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Tables without which scoring would silently degrade to neutral values.
    pub const REQUIRED: [TableComponent; 8] = [
        Self::VowelLocation,
        Self::VowelOpenness,
        Self::Softness,
        Self::Tone,
        Self::Length,
        Self::Syllables,
        Self::HeadTransition,
        Self::EndStartTransition,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Key of this table in the artifact.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::VowelLocation => "vowel_location",
            Self::VowelOpenness => "vowel_openess",
            Self::Softness => "softness",
            Self::Tone => "tone",
            Self::Rhythm => "rhythm",
            Self::Length => "length",
            Self::Syllables => "syllables",
            Self::HeadTransition => "head_transition",
            Self::EndStartTransition => "end_start_transition",
            Self::EdgeVowelLocation => "edge_vowel_location",
            Self::EdgeVowelOpenness => "edge_vowel_openess",
            Self::EdgeSoftness => "edge_softness",
            Self::EdgeTone => "edge_tone",
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        let table = match name {
            "vowel_location" => Self::VowelLocation,
            "vowel_openess" | "vowel_openness" => Self::VowelOpenness,
            "softness" => Self::Softness,
            "tone" => Self::Tone,
            "rhythm" => Self::Rhythm,
            "length" => Self::Length,
            "syllables" => Self::Syllables,
            "head_transition" => Self::HeadTransition,
            "end_start_transition" | "junction_transition" => Self::EndStartTransition,
            "edge_vowel_location" => Self::EdgeVowelLocation,
            "edge_vowel_openess" | "edge_vowel_openness" => Self::EdgeVowelOpenness,
            "edge_softness" => Self::EdgeSoftness,
            "edge_tone" => Self::EdgeTone,
            _ => return None,
        };
        Some(table)
    }

    /// The boundary-syllable variant blended into this whole-name table.
    pub fn edge_variant(self) -> Option<Self> {
        match self {
            Self::VowelLocation => Some(Self::EdgeVowelLocation),
            Self::VowelOpenness => Some(Self::EdgeVowelOpenness),
            Self::Softness => Some(Self::EdgeSoftness),
            Self::Tone => Some(Self::EdgeTone),
            _ => None,
        }
    }
}

/// Conditional probability tables plus their unconditional baselines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticalModel {
    /// `component -> cond_bucket -> obs_bucket -> probability`
    pub tables: BTreeMap<String, ConditionalTable>,

    /// `component -> obs_bucket -> probability`
    #[serde(default)]
    pub baselines: BTreeMap<String, Distribution>,

    /// System default weights shipped with the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_weights: Option<BTreeMap<String, f64>>,
}

impl StatisticalModel {
    /// Load and validate an artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            tables = model.tables.len(),
            baselines = model.baselines.len(),
            "Loaded statistical model"
        );
        Ok(model)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ModelLoadError> {
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Reject artifacts that would make every score a meaningless fallback.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.tables.is_empty() {
            return Err(ModelLoadError::Empty);
        }

        for required in TableComponent::REQUIRED {
            if self.table(required).is_none() {
                return Err(ModelLoadError::MissingTable(required.table_name()));
            }
        }

        for (component, table) in &self.tables {
            if TableComponent::from_table_name(component).is_none() {
                tracing::warn!(component = %component, "Ignoring unknown table in model artifact");
            }
            for (row, dist) in table {
                check_distribution(component, row, dist)?;
            }
        }

        for (component, dist) in &self.baselines {
            check_distribution(component, "baseline", dist)?;
        }

        Ok(())
    }

    /// Table for a component, accepting either historical spelling.
    pub fn table(&self, component: TableComponent) -> Option<&ConditionalTable> {
        self.tables.get(component.table_name()).or_else(|| {
            self.tables
                .iter()
                .find(|(name, _)| TableComponent::from_table_name(name) == Some(component))
                .map(|(_, table)| table)
        })
    }

    pub fn baseline(&self, component: TableComponent) -> Option<&Distribution> {
        self.baselines.get(component.table_name()).or_else(|| {
            self.baselines
                .iter()
                .find(|(name, _)| TableComponent::from_table_name(name) == Some(component))
                .map(|(_, dist)| dist)
        })
    }
}

fn check_distribution(component: &str, row: &str, dist: &Distribution) -> Result<(), ModelLoadError> {
    for (bucket, &value) in dist {
        if !value.is_finite() || value < 0.0 {
            return Err(ModelLoadError::InvalidProbability {
                component: component.to_string(),
                row: row.to_string(),
                bucket: bucket.to_string(),
                value,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json(extra: &str) -> String {
        let tables: Vec<String> = TableComponent::REQUIRED
            .iter()
            .map(|t| format!(r#""{}": {{"_default": {{"x": 0.5}}}}"#, t.table_name()))
            .collect();
        format!(r#"{{"tables": {{{}{}}}}}"#, tables.join(","), extra)
    }

    #[test]
    fn test_minimal_model_loads() {
        let model = StatisticalModel::from_json_str(&minimal_json("")).unwrap();
        assert!(model.table(TableComponent::VowelOpenness).is_some());
        assert!(model.table(TableComponent::Rhythm).is_none());
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = StatisticalModel::from_json_str(r#"{"tables": {}}"#).unwrap_err();
        assert!(matches!(err, ModelLoadError::Empty));
    }

    #[test]
    fn test_missing_table_rejected() {
        let err = StatisticalModel::from_json_str(r#"{"tables": {"tone": {}}}"#).unwrap_err();
        assert!(matches!(err, ModelLoadError::MissingTable("vowel_location")));
    }

    #[test]
    fn test_negative_probability_rejected() {
        let json = minimal_json(r#","rhythm": {"RK": {"RR": -0.1}}"#);
        let err = StatisticalModel::from_json_str(&json).unwrap_err();
        match err {
            ModelLoadError::InvalidProbability { component, row, bucket, .. } => {
                assert_eq!(component, "rhythm");
                assert_eq!(row, "RK");
                assert_eq!(bucket, "RR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = StatisticalModel::from_json_str("{\"tables\": [").unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }

    #[test]
    fn test_alternate_spelling_resolves() {
        let json = minimal_json("").replace("vowel_openess", "vowel_openness");
        let model = StatisticalModel::from_json_str(&json).unwrap();
        assert!(model.table(TableComponent::VowelOpenness).is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StatisticalModel::load("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }
}
