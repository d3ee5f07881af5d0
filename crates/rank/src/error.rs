use std::path::PathBuf;

use nimipari_scoring::ConfigError;
use thiserror::Error;

use crate::scan::ScanError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}
