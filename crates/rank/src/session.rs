//! Load-once engine state shared by many queries.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nimipari_features::{build_profiles, NameProfile};
use nimipari_model::{select_top_entries, Dataset, NameEntry, ScoredPair, StatisticalModel, WeightVector};
use nimipari_scoring::{CompiledModel, PairScorer};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::scan::{self, CancelToken, ProgressFn, ScanControl};

/// Popularity-capped candidate pools. Immutable once built, so an
/// in-flight scan keeps its snapshot when a newer request replaces it.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub top_first: usize,
    pub top_last: usize,
    pub firsts: Arc<[NameProfile]>,
    pub lasts: Arc<[NameProfile]>,
}

/// Parameters of one global scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    pub top_first: usize,
    pub top_last: usize,
    pub k: usize,
}

#[derive(Debug)]
struct NameIndex {
    entries: Vec<NameEntry>,
    profiles: Vec<NameProfile>,
    by_key: HashMap<String, usize>,
}

impl NameIndex {
    /// Keys are trimmed and lowercased. Blank keys are dropped and a
    /// repeated key keeps its first entry.
    fn build(dataset: Vec<NameEntry>, config: &EngineConfig) -> Self {
        let mut seen = HashSet::with_capacity(dataset.len());
        let mut entries = Vec::with_capacity(dataset.len());
        for mut entry in dataset {
            let key = entry.key.trim().to_lowercase();
            if key.is_empty() {
                tracing::warn!(display = %entry.display, "Skipping name entry without a key");
                continue;
            }
            if !seen.insert(key.clone()) {
                tracing::warn!(key = %key, "Skipping duplicate name entry");
                continue;
            }
            entry.key = key;
            entries.push(entry);
        }
        let profiles = build_profiles(&mut entries, &config.buckets);
        let by_key = profiles
            .iter()
            .enumerate()
            .map(|(i, profile)| (profile.key.clone(), i))
            .collect();
        Self {
            entries,
            profiles,
            by_key,
        }
    }

    fn get(&self, key: &str) -> Option<&NameProfile> {
        self.by_key
            .get(&key.trim().to_lowercase())
            .map(|&i| &self.profiles[i])
    }

    fn top(&self, n: usize) -> Arc<[NameProfile]> {
        select_top_entries(&self.entries, n)
            .iter()
            .filter_map(|entry| self.by_key.get(&entry.key).map(|&i| self.profiles[i].clone()))
            .collect()
    }
}

/// A loaded model and dataset, ready for pair queries and scans.
#[derive(Debug)]
pub struct EngineSession {
    model: Arc<CompiledModel>,
    config: EngineConfig,
    first_names: NameIndex,
    last_names: NameIndex,
    pools: Mutex<Option<PoolSnapshot>>,
    active: Mutex<Option<CancelToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EngineSession {
    pub fn new(model: StatisticalModel, dataset: Dataset, config: EngineConfig) -> Self {
        let model = Arc::new(CompiledModel::compile(model));
        let first_names = NameIndex::build(dataset.first_names, &config);
        let last_names = NameIndex::build(dataset.last_names, &config);
        tracing::info!(
            first = first_names.profiles.len(),
            last = last_names.profiles.len(),
            "Engine session ready"
        );
        Self {
            model,
            config,
            first_names,
            last_names,
            pools: Mutex::new(None),
            active: Mutex::new(None),
        }
    }

    pub fn model(&self) -> &Arc<CompiledModel> {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Weights shipped with the model, or the system default.
    pub fn default_weights(&self) -> WeightVector {
        WeightVector::from_model(self.model.source())
    }

    pub fn first(&self, key: &str) -> Result<&NameProfile, EngineError> {
        self.first_names
            .get(key)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown first name '{key}'")))
    }

    pub fn last(&self, key: &str) -> Result<&NameProfile, EngineError> {
        self.last_names
            .get(key)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown last name '{key}'")))
    }

    pub fn scorer(&self, weights: &WeightVector) -> PairScorer<'_> {
        PairScorer::new(&self.model, *weights, self.config.scoring)
    }

    pub fn score_pair(&self, first: &str, last: &str, weights: &WeightVector) -> Result<ScoredPair, EngineError> {
        let first = self.first(first)?;
        let last = self.last(last)?;
        Ok(self.scorer(weights).score(first, last))
    }

    /// Request sized by the configured defaults.
    pub fn default_request(&self) -> ScanRequest {
        ScanRequest {
            top_first: self.config.rank.top_first,
            top_last: self.config.rank.top_last,
            k: self.config.rank.k,
        }
    }

    /// Pools for the given caps, rebuilt only when the caps change.
    pub fn pools(&self, top_first: usize, top_last: usize) -> PoolSnapshot {
        let mut cached = lock(&self.pools);
        if let Some(snapshot) = cached.as_ref() {
            if snapshot.top_first == top_first && snapshot.top_last == top_last {
                return snapshot.clone();
            }
        }
        let snapshot = PoolSnapshot {
            top_first,
            top_last,
            firsts: self.first_names.top(top_first),
            lasts: self.last_names.top(top_last),
        };
        tracing::debug!(
            firsts = snapshot.firsts.len(),
            lasts = snapshot.lasts.len(),
            "Built candidate pools"
        );
        *cached = Some(snapshot.clone());
        snapshot
    }

    /// Register a new scan, cancelling the one it supersedes.
    pub fn start_scan(&self) -> CancelToken {
        let token = CancelToken::new();
        if let Some(previous) = lock(&self.active).replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancel whatever scan is in flight.
    pub fn cancel_active(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            token.cancel();
        }
    }

    /// Global top-K over the popularity-capped pools.
    pub fn best_pairs(
        &self,
        weights: &WeightVector,
        request: ScanRequest,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<ScoredPair>, EngineError> {
        let token = self.start_scan();
        let pools = self.pools(request.top_first, request.top_last);
        let mut control = ScanControl::new(token);
        if let Some(progress) = progress {
            control = control.with_progress(progress, self.config.rank.progress_batch);
        }
        let pairs = scan::select_top_k(&pools.firsts, &pools.lasts, &self.scorer(weights), request.k, &control)?;
        Ok(pairs)
    }

    /// Best partners for one first name among the current last-name pool.
    pub fn best_for_first(
        &self,
        first: &str,
        weights: &WeightVector,
        limit: usize,
    ) -> Result<Vec<ScoredPair>, EngineError> {
        let first = self.first(first)?;
        let (top_first, top_last) = lock(&self.pools)
            .as_ref()
            .map(|s| (s.top_first, s.top_last))
            .unwrap_or((self.config.rank.top_first, self.config.rank.top_last));
        let pools = self.pools(top_first, top_last);
        let limit = limit.min(self.config.rank.partner_limit);
        Ok(scan::best_for_first(first, &pools.lasts, &self.scorer(weights), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MODEL_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/model.json"));

    fn session() -> EngineSession {
        let dataset = Dataset {
            first_names: vec![
                NameEntry::new("Aino", "ɑi-no").with_popularity(40_000),
                NameEntry::new("Lumi", "lu-mi").with_popularity(600),
                NameEntry::new("Saana", "sɑː-nɑ").with_popularity(150),
            ],
            last_names: vec![
                NameEntry::new("Salo", "sɑ-lo").with_popularity(7_000),
                NameEntry::new("Korhonen", "kor-ho-nen").with_popularity(22_000),
            ],
        };
        let model = StatisticalModel::from_json_str(MODEL_JSON).unwrap();
        EngineSession::new(model, dataset, EngineConfig::default())
    }

    #[test]
    fn test_score_pair_by_key() {
        let session = session();
        let weights = session.default_weights();
        let pair = session.score_pair(" Aino ", "SALO", &weights).unwrap();
        assert_eq!(pair.first_key, "aino");
        assert_eq!(pair.last_key, "salo");
    }

    #[test]
    fn test_unknown_key_is_invalid_input() {
        let session = session();
        let err = session
            .score_pair("nobody", "salo", &WeightVector::system_default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_pools_are_cached_per_caps() {
        let session = session();
        let a = session.pools(2, 1);
        let b = session.pools(2, 1);
        assert!(Arc::ptr_eq(&a.firsts, &b.firsts));
        let keys: Vec<&str> = a.firsts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["aino", "lumi"]);
        assert_eq!(a.lasts[0].key, "korhonen");

        let c = session.pools(3, 1);
        assert!(!Arc::ptr_eq(&a.firsts, &c.firsts));
        assert_eq!(c.firsts.len(), 3);
    }

    #[test]
    fn test_excessive_precision_keeps_score_in_range() {
        let mut config = EngineConfig::default();
        config.scoring.precision = 400;
        let dataset = Dataset {
            first_names: vec![NameEntry::new("Aino", "ɑi-no").with_popularity(40_000)],
            last_names: vec![NameEntry::new("Salo", "sɑ-lo").with_popularity(7_000)],
        };
        let model = StatisticalModel::from_json_str(MODEL_JSON).unwrap();
        let session = EngineSession::new(model, dataset, config);

        let pair = session
            .score_pair("aino", "salo", &WeightVector::system_default())
            .unwrap();
        assert!((0.0..=1.0).contains(&pair.normalized), "normalized = {}", pair.normalized);
    }

    #[test]
    fn test_duplicate_keys_keep_first_entry() {
        let dataset = Dataset {
            first_names: vec![
                NameEntry::new("Aino", "ɑi-no").with_popularity(500),
                NameEntry::new(" AINO ", "ɑi-no").with_popularity(100),
            ],
            last_names: vec![NameEntry::new("Salo", "sɑ-lo").with_popularity(7_000)],
        };
        let model = StatisticalModel::from_json_str(MODEL_JSON).unwrap();
        let session = EngineSession::new(model, dataset, EngineConfig::default());

        let pools = session.pools(2, 1);
        let popularity: Vec<u64> = pools.firsts.iter().map(|p| p.popularity).collect();
        assert_eq!(popularity, vec![500]);
        assert_eq!(session.first("aino").unwrap().popularity, 500);

        let request = ScanRequest {
            top_first: 2,
            top_last: 1,
            k: 5,
        };
        let pairs = session.best_pairs(&session.default_weights(), request, None).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first_key, "aino");
    }

    #[test]
    fn test_new_scan_cancels_previous() {
        let session = session();
        let first = session.start_scan();
        let second = session.start_scan();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        session.cancel_active();
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_best_pairs_covers_cross_product() {
        let session = session();
        let request = ScanRequest {
            top_first: 3,
            top_last: 2,
            k: 10,
        };
        let pairs = session.best_pairs(&session.default_weights(), request, None).unwrap();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.windows(2).all(|w| w[0].normalized >= w[1].normalized));
    }

    #[test]
    fn test_best_for_first_uses_last_pool() {
        let session = session();
        session.pools(3, 1);
        let pairs = session.best_for_first("lumi", &session.default_weights(), 10).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].last_key, "korhonen");
    }
}
