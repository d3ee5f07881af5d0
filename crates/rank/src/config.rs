//! Engine configuration, loadable from a JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nimipari_features::BucketConfig;
use nimipari_scoring::ScoringConfig;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Pool caps and scan sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Most popular first names entering a global scan
    pub top_first: usize,
    /// Most popular last names entering a global scan
    pub top_last: usize,
    /// Pairs kept by a global scan
    pub k: usize,
    /// First names between progress reports
    pub progress_batch: usize,
    /// Cap on partners listed for a single first name
    pub partner_limit: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_first: 3000,
            top_last: 3000,
            k: 5000,
            progress_batch: 50,
            partner_limit: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub buckets: BucketConfig,
    pub scoring: ScoringConfig,
    pub rank: RankConfig,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            EngineError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.scoring.validate().map_err(|source| EngineError::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Loaded engine configuration");
        Ok(config)
    }
}
