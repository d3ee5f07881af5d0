//! Name datasets as delivered by the data-preparation pipeline.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::NameEntry;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed name file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate name key '{0}'")]
    DuplicateKey(String),
}

/// On-disk payload of one name file: `{"names": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamePool {
    #[serde(default)]
    pub names: Vec<NameEntry>,
}

impl NamePool {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let pool: Self = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            DatasetError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(pool)
    }

    /// Drop blank keys, lowercase the rest and reject duplicates.
    pub fn into_entries(self) -> Result<Vec<NameEntry>, DatasetError> {
        let mut seen = HashSet::with_capacity(self.names.len());
        let mut entries = Vec::with_capacity(self.names.len());
        for mut entry in self.names {
            let key = entry.key.trim().to_lowercase();
            if key.is_empty() {
                tracing::warn!(display = %entry.display, "Skipping name entry without a key");
                continue;
            }
            if !seen.insert(key.clone()) {
                return Err(DatasetError::DuplicateKey(key));
            }
            entry.key = key;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// First and last names loaded for one session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub first_names: Vec<NameEntry>,
    pub last_names: Vec<NameEntry>,
}

impl Dataset {
    pub fn load(first_path: impl AsRef<Path>, last_path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let first_names = NamePool::load(first_path)?.into_entries()?;
        let last_names = NamePool::load(last_path)?.into_entries()?;
        tracing::info!(
            first = first_names.len(),
            last = last_names.len(),
            "Loaded name dataset"
        );
        Ok(Self {
            first_names,
            last_names,
        })
    }
}

/// The `n` most popular entries, most popular first. Equal counts keep
/// their input order.
pub fn select_top_entries(entries: &[NameEntry], n: usize) -> Vec<NameEntry> {
    let mut sorted: Vec<&NameEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.popularity.total().cmp(&a.popularity.total()));
    sorted.into_iter().take(n).cloned().collect()
}
