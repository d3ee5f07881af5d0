//! Bounded top-K selection over a stream of scored pairs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Upper bound on up-front heap allocation.
const MAX_PREALLOC: usize = 1 << 16;

/// A pair reduced to its score and pool positions.
#[derive(Debug, Clone, Copy)]
pub struct RankedPair {
    pub score: f64,
    /// Index into the first-name pool
    pub first: usize,
    /// Index into the last-name pool
    pub last: usize,
}

impl RankedPair {
    pub fn new(score: f64, first: usize, last: usize) -> Self {
        Self { score, first, last }
    }
}

// Greater is better: higher score, then lower pool positions.
impl Ord for RankedPair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.first.cmp(&self.first))
            .then_with(|| other.last.cmp(&self.last))
    }
}

impl PartialOrd for RankedPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankedPair {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedPair {}

/// The `capacity` best pairs seen so far.
///
/// Backed by a min-heap whose root is the worst retained pair, so a new
/// pair costs one comparison unless it displaces the root.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<RankedPair>>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(MAX_PREALLOC)),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score of the worst retained pair.
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(pair)| pair.score)
    }

    pub fn push(&mut self, pair: RankedPair) {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(pair));
            return;
        }
        if let Some(mut worst) = self.heap.peek_mut() {
            if pair > worst.0 {
                *worst = Reverse(pair);
            }
        }
    }

    /// Combine two partial selections of the same capacity.
    pub fn merge(mut self, other: TopK) -> TopK {
        if self.heap.len() < other.heap.len() {
            return other.merge(self);
        }
        for Reverse(pair) in other.heap {
            self.push(pair);
        }
        self
    }

    /// Retained pairs, best first.
    pub fn into_sorted_vec(self) -> Vec<RankedPair> {
        let mut pairs: Vec<RankedPair> = self.heap.into_iter().map(|Reverse(pair)| pair).collect();
        pairs.sort_unstable_by(|a, b| b.cmp(a));
        pairs
    }
}

impl Extend<RankedPair> for TopK {
    fn extend<I: IntoIterator<Item = RankedPair>>(&mut self, iter: I) {
        for pair in iter {
            self.push(pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scores(pairs: &[RankedPair]) -> Vec<f64> {
        pairs.iter().map(|p| p.score).collect()
    }

    #[test]
    fn test_keeps_best_k() {
        let mut top = TopK::new(3);
        for (i, score) in [0.2, 0.9, 0.1, 0.5, 0.7, 0.3].into_iter().enumerate() {
            top.push(RankedPair::new(score, i, 0));
        }
        assert_eq!(top.min_score(), Some(0.5));
        assert_eq!(scores(&top.into_sorted_vec()), vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut top = TopK::new(4);
        for i in 0..100 {
            top.push(RankedPair::new((i * 37 % 101) as f64 / 100.0, i, i));
            assert!(top.len() <= 4);
        }
        assert_eq!(top.len(), 4);
    }

    #[test]
    fn test_zero_capacity() {
        let mut top = TopK::new(0);
        top.push(RankedPair::new(1.0, 0, 0));
        assert!(top.is_empty());
    }

    #[test]
    fn test_ties_prefer_lower_positions() {
        let mut top = TopK::new(2);
        top.push(RankedPair::new(0.5, 2, 0));
        top.push(RankedPair::new(0.5, 0, 1));
        top.push(RankedPair::new(0.5, 0, 0));
        let kept: Vec<(usize, usize)> = top.into_sorted_vec().iter().map(|p| (p.first, p.last)).collect();
        assert_eq!(kept, vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let pairs: Vec<RankedPair> = (0..40)
            .map(|i| RankedPair::new((i * 17 % 23) as f64, i, 0))
            .collect();

        let mut single = TopK::new(5);
        single.extend(pairs.iter().copied());

        let mut left = TopK::new(5);
        left.extend(pairs[..13].iter().copied());
        let mut right = TopK::new(5);
        right.extend(pairs[13..].iter().copied());

        let merged = left.merge(right).into_sorted_vec();
        let expected = single.into_sorted_vec();
        assert_eq!(merged.len(), expected.len());
        assert!(merged.iter().zip(&expected).all(|(a, b)| a == b));
    }
}
