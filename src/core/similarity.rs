//! Normalized edit-distance similarity.
//!
//! Distances are computed over Unicode scalar values, so a multi-byte
//! character counts as one edit. Only two rows of the DP table are kept.

/// Levenshtein distance between `a` and `b` (insert, delete, substitute).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_chars(&a, &b)
}

fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    // Keep the shorter string along the row to bound memory
    let (a, b) = if a.len() < b.len() { (b, a) } else { (a, b) };

    // Row 0: distance from the empty prefix of `a`
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity in `[0, 1]`: `1 - distance / max(len)`.
///
/// Two empty strings are identical and score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    let dist = levenshtein_chars(&a, &b);
    1.0 - dist as f64 / max_len as f64
}

/// Highest similarity any pair of strings with these char lengths can reach.
///
/// The edit distance is never below the length difference, so a candidate
/// whose bound is under the threshold cannot match.
pub fn similarity_upper_bound(len_a: usize, len_b: usize) -> f64 {
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    1.0 - len_a.abs_diff(len_b) as f64 / max_len as f64
}
