//! Rhythm comparison by edit distance over R/K codes.

/// Codes shorter than this are compared without touching the heap.
const STACK_ROW: usize = 32;

/// Levenshtein edit distance between two byte strings.
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    if b.len() < STACK_ROW {
        let mut prev = [0usize; STACK_ROW];
        let mut curr = [0usize; STACK_ROW];
        levenshtein(a, b, &mut prev[..=b.len()], &mut curr[..=b.len()])
    } else {
        let mut prev = vec![0; b.len() + 1];
        let mut curr = vec![0; b.len() + 1];
        levenshtein(a, b, &mut prev, &mut curr)
    }
}

/// Two-row dynamic programme; both rows hold `b.len() + 1` cells.
fn levenshtein<'a>(a: &[u8], b: &[u8], mut prev: &'a mut [usize], mut curr: &'a mut [usize]) -> usize {
    for (j, cell) in prev.iter_mut().enumerate() {
        *cell = j;
    }
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity in [0, 1]: one minus the edit distance over the longer code.
/// A missing code on either side scores 0. Codes are ASCII `R`/`K`.
pub fn rhythm_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let distance = edit_distance(a.as_bytes(), b.as_bytes()) as f64;
    let longest = a.len().max(b.len()) as f64;
    (1.0 - distance / longest).clamp(0.0, 1.0)
}
