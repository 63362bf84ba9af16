//! Approximate substring search bounded by Levenshtein distance.
//!
//! A forward pass (Sellers' algorithm) finds every text position where some
//! substring ending there is within `max_distance` of the pattern. For each
//! such end a backward pass picks the best start. Overlapping candidates are
//! then pruned: a candidate is dropped when an overlapping one has a strictly
//! lower distance, or the same distance and strictly contains it.

use serde::{Deserialize, Serialize};

/// One approximate occurrence of a term in a text.
///
/// `start` and `end` are byte offsets into the searched text, so
/// `&text[start..end] == matched`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub matched: String,
    pub distance: usize,
    pub start: usize,
    pub end: usize,
}

/// Candidate in char offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    start: usize,
    end: usize,
    distance: usize,
}

impl Candidate {
    fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn strictly_contains(&self, other: &Candidate) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && (self.end - self.start) > (other.end - other.start)
    }

    /// True if `self` makes `other` redundant
    fn dominates(&self, other: &Candidate) -> bool {
        self.overlaps(other)
            && (self.distance < other.distance
                || (self.distance == other.distance && self.strictly_contains(other)))
    }
}

/// Find all occurrences of `pattern` in `text` within `max_distance` edits,
/// in text order. An empty pattern matches nothing.
pub fn find_near_matches(pattern: &str, text: &str, max_distance: usize) -> Vec<Occurrence> {
    let pattern: Vec<char> = pattern.chars().collect();
    if pattern.is_empty() || text.is_empty() {
        return Vec::new();
    }
    let max_distance = clamp_distance(&pattern, max_distance);

    let chars: Vec<char> = text.chars().collect();
    let candidates = find_candidates(&pattern, &chars, max_distance);
    let kept = prune(&candidates, pattern.len() + max_distance);

    if kept.is_empty() {
        return Vec::new();
    }

    // Char offset -> byte offset
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    kept.into_iter()
        .map(|c| {
            let start = boundaries[c.start];
            let end = boundaries[c.end];
            Occurrence {
                matched: text[start..end].to_string(),
                distance: c.distance,
                start,
                end,
            }
        })
        .collect()
}

/// True if `pattern` occurs in `text` within `max_distance` edits
pub fn is_near_match(pattern: &str, text: &str, max_distance: usize) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    if pattern.is_empty() {
        return false;
    }

    let max_distance = clamp_distance(&pattern, max_distance);
    let m = pattern.len();
    let mut column: Vec<usize> = (0..=m).collect();
    text.chars().any(|c| {
        advance_column(&mut column, &pattern, c);
        column[m] <= max_distance
    })
}

/// Levenshtein distance between two strings, by chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Every single char is within `pattern.len()` edits of the pattern, so no
/// bound above that changes the result.
fn clamp_distance(pattern: &[char], max_distance: usize) -> usize {
    max_distance.min(pattern.len())
}

/// One step of Sellers' algorithm: `column[i]` becomes the lowest distance
/// between `pattern[..i]` and any text substring ending at `c`.
#[inline]
fn advance_column(column: &mut [usize], pattern: &[char], c: char) {
    // column[0] stays 0: a match may start anywhere
    let mut diag = column[0];
    for i in 1..column.len() {
        let cost = usize::from(pattern[i - 1] != c);
        let next = (column[i] + 1).min(column[i - 1] + 1).min(diag + cost);
        diag = column[i];
        column[i] = next;
    }
}

/// Forward pass: one candidate per end position within `max_distance`
fn find_candidates(pattern: &[char], chars: &[char], max_distance: usize) -> Vec<Candidate> {
    let m = pattern.len();
    let mut column: Vec<usize> = (0..=m).collect();
    let mut candidates = Vec::new();

    for (j, &c) in chars.iter().enumerate() {
        advance_column(&mut column, pattern, c);
        if column[m] <= max_distance {
            let end = j + 1;
            if let Some((start, distance)) = best_start(pattern, chars, end, max_distance) {
                candidates.push(Candidate {
                    start,
                    end,
                    distance,
                });
            }
        }
    }

    candidates
}

/// Backward pass: the best non-empty substring ending at `end`.
///
/// Preference: lowest distance, then length closest to the pattern, then
/// shortest.
fn best_start(
    pattern: &[char],
    chars: &[char],
    end: usize,
    max_distance: usize,
) -> Option<(usize, usize)> {
    let m = pattern.len();
    let span = end.min(m + max_distance);

    // prev[i]: distance between the last i pattern chars and the last t text chars
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];
    let mut best: Option<(usize, usize, usize)> = None; // (distance, length gap, t)

    for t in 1..=span {
        let c = chars[end - t];
        curr[0] = t;
        for i in 1..=m {
            let cost = usize::from(pattern[m - i] != c);
            curr[i] = (prev[i] + 1).min(curr[i - 1] + 1).min(prev[i - 1] + cost);
        }

        let distance = curr[m];
        if distance <= max_distance {
            let key = (distance, t.abs_diff(m), t);
            if best.is_none_or(|b| key < b) {
                best = Some(key);
            }
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    best.map(|(distance, _, t)| (end - t, distance))
}

/// Drop dominated candidates. Candidates arrive sorted by end; a candidate
/// spans at most `max_len` chars, which bounds the neighbourhood to scan.
fn prune(candidates: &[Candidate], max_len: usize) -> Vec<Candidate> {
    let mut kept = Vec::with_capacity(candidates.len());

    for (idx, cand) in candidates.iter().enumerate() {
        let earlier = candidates[..idx]
            .iter()
            .rev()
            .take_while(|other| other.end > cand.start);
        let later = candidates[idx + 1..]
            .iter()
            .take_while(|other| other.end < cand.end + max_len + 1);

        let dominated = earlier.chain(later).any(|other| other.dominates(cand));
        if !dominated {
            kept.push(*cand);
        }
    }

    // Ends are unique, so ordering by start then end gives text order
    kept.sort_by_key(|c| (c.start, c.end));
    kept
}
