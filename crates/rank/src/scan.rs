//! Cross-product scans: global top-K and best partners for one name.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use nimipari_features::NameProfile;
use nimipari_model::ScoredPair;
use nimipari_scoring::PairScorer;
use rayon::prelude::*;
use thiserror::Error;

use crate::topk::{RankedPair, TopK};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    #[error("Scan cancelled")]
    Cancelled,
}

/// Shared flag telling an in-flight scan to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outer-loop progress of a running scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// First names fully scanned
    pub processed: usize,
    pub total: usize,
}

/// Progress callback. Called from worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(ScanProgress) + Sync);

/// Cancellation and progress hooks for one scan.
#[derive(Clone, Default)]
pub struct ScanControl<'a> {
    pub cancel: CancelToken,
    pub progress: Option<ProgressFn<'a>>,
    /// Report progress every this many first names
    pub progress_batch: usize,
}

impl<'a> ScanControl<'a> {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            progress: None,
            progress_batch: 50,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn<'a>, batch: usize) -> Self {
        self.progress = Some(progress);
        self.progress_batch = batch.max(1);
        self
    }

    fn report(&self, processed: usize, total: usize) {
        if let Some(progress) = self.progress {
            if processed % self.progress_batch.max(1) == 0 || processed == total {
                progress(ScanProgress { processed, total });
            }
        }
    }
}

/// The `k` best pairs of `firsts × lasts`, best first.
///
/// First names are spread over the rayon pool; each worker keeps its own
/// bounded heap and the heaps are merged at the end. Ties resolve toward
/// lower pool positions, so the result does not depend on scheduling.
/// Only the winners get a full component breakdown.
pub fn select_top_k(
    firsts: &[NameProfile],
    lasts: &[NameProfile],
    scorer: &PairScorer<'_>,
    k: usize,
    control: &ScanControl<'_>,
) -> Result<Vec<ScoredPair>, ScanError> {
    let ranked = scan_top_k(firsts, lasts, scorer, k, control)?;
    Ok(ranked
        .into_iter()
        .map(|pair| scorer.score(&firsts[pair.first], &lasts[pair.last]))
        .collect())
}

/// `select_top_k` without materializing the winners.
pub fn scan_top_k(
    firsts: &[NameProfile],
    lasts: &[NameProfile],
    scorer: &PairScorer<'_>,
    k: usize,
    control: &ScanControl<'_>,
) -> Result<Vec<RankedPair>, ScanError> {
    let started = Instant::now();
    let total = firsts.len();
    tracing::debug!(firsts = total, lasts = lasts.len(), k, "Starting top-k scan");

    let processed = AtomicUsize::new(0);
    let top = firsts
        .par_iter()
        .enumerate()
        .fold(
            || TopK::new(k),
            |mut top, (i, first)| {
                if control.cancel.is_cancelled() {
                    return top;
                }
                for (j, last) in lasts.iter().enumerate() {
                    top.push(RankedPair::new(scorer.normalized(first, last), i, j));
                }
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                control.report(done, total);
                top
            },
        )
        .reduce(|| TopK::new(k), TopK::merge);

    if control.cancel.is_cancelled() {
        tracing::debug!(
            processed = processed.load(Ordering::Relaxed),
            total,
            "Top-k scan cancelled"
        );
        return Err(ScanError::Cancelled);
    }

    let ranked = top.into_sorted_vec();
    tracing::debug!(
        pairs = total * lasts.len(),
        kept = ranked.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Finished top-k scan"
    );
    Ok(ranked)
}

/// Best last names for one first name, best first.
///
/// The partner pool is small enough to score and sort outright.
pub fn best_for_first(
    first: &NameProfile,
    lasts: &[NameProfile],
    scorer: &PairScorer<'_>,
    limit: usize,
) -> Vec<ScoredPair> {
    let mut ranked: Vec<RankedPair> = lasts
        .iter()
        .enumerate()
        .map(|(j, last)| RankedPair::new(scorer.normalized(first, last), 0, j))
        .collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));
    ranked
        .into_iter()
        .take(limit)
        .map(|pair| scorer.score(first, &lasts[pair.last]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimipari_features::BucketConfig;
    use nimipari_model::{NameEntry, StatisticalModel, WeightVector};
    use nimipari_scoring::{CompiledModel, ScoringConfig};
    use std::sync::Mutex;

    const MODEL_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/model.json"));

    fn model() -> CompiledModel {
        CompiledModel::compile(StatisticalModel::from_json_str(MODEL_JSON).unwrap())
    }

    fn pool(names: &[(&str, &str)]) -> Vec<NameProfile> {
        let mut entries: Vec<NameEntry> = names.iter().map(|(n, t)| NameEntry::new(*n, *t)).collect();
        nimipari_features::build_profiles(&mut entries, &BucketConfig::default())
    }

    #[test]
    fn test_progress_is_reported_per_batch() {
        let model = model();
        let scorer = PairScorer::new(&model, WeightVector::system_default(), ScoringConfig::default());
        let firsts = pool(&[("Aino", "ɑi-no"), ("Eino", "ei-no"), ("Lumi", "lu-mi"), ("Saana", "sɑː-nɑ"), ("Oona", "oː-nɑ")]);
        let lasts = pool(&[("Salo", "sɑ-lo"), ("Korhonen", "kor-ho-nen")]);

        let seen = Mutex::new(Vec::new());
        {
            let record = |p: ScanProgress| seen.lock().unwrap().push(p.processed);
            let control = ScanControl::new(CancelToken::new()).with_progress(&record, 2);
            let result = select_top_k(&firsts, &lasts, &scorer, 3, &control).unwrap();
            assert_eq!(result.len(), 3);
        }

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![2, 4, 5]);
    }

    #[test]
    fn test_cancelled_scan_returns_no_pairs() {
        let model = model();
        let scorer = PairScorer::new(&model, WeightVector::system_default(), ScoringConfig::default());
        let firsts = pool(&[("Aino", "ɑi-no"), ("Eino", "ei-no")]);
        let lasts = pool(&[("Salo", "sɑ-lo")]);

        let token = CancelToken::new();
        token.cancel();
        let result = select_top_k(&firsts, &lasts, &scorer, 5, &ScanControl::new(token));
        assert_eq!(result, Err(ScanError::Cancelled));
    }

    #[test]
    fn test_best_for_first_is_sorted_and_limited() {
        let model = model();
        let scorer = PairScorer::new(&model, WeightVector::system_default(), ScoringConfig::default());
        let firsts = pool(&[("Kristian", "kris-ti-ɑn")]);
        let first = &firsts[0];
        let lasts = pool(&[
            ("Salo", "sɑ-lo"),
            ("Korhonen", "kor-ho-nen"),
            ("Virtanen", "vir-tɑ-nen"),
            ("Mäkinen", "mæ-ki-nen"),
        ]);

        let best = best_for_first(first, &lasts, &scorer, 3);
        assert_eq!(best.len(), 3);
        assert!(best.windows(2).all(|w| w[0].normalized >= w[1].normalized));
        assert!(best.iter().all(|p| p.first_key == "kristian"));
    }
}
