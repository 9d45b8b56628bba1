//! Typo-tolerant fallback matcher for the category aggregation path.
//!
//! Accepts a candidate alias when one of these holds:
//! - edit distance is within the length-scaled threshold
//! - character multiset difference is at most `min(2, threshold)`
//! - one token contains the other
//!
//! Among accepted aliases the lowest edit distance wins, then the shortest
//! alias, then registration order.

use std::collections::HashMap;

use super::normalize::normalize_token;
use super::synonyms::SynonymIndex;

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Allowed edit distance for a token of `len` chars.
pub fn distance_threshold(len: usize) -> usize {
    match len {
        0..=5 => 1,
        6..=9 => 2,
        _ => 3,
    }
}

/// Number of chars that must be added or removed to turn one multiset into the other.
pub fn multiset_difference(a: &str, b: &str) -> usize {
    let mut counts: HashMap<char, i64> = HashMap::new();
    for c in a.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    for c in b.chars() {
        *counts.entry(c).or_insert(0) -= 1;
    }
    counts.values().map(|n| n.unsigned_abs() as usize).sum()
}

/// Edit distance between two normalized tokens when they are considered a match.
pub fn token_match(a: &str, b: &str) -> Option<usize> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let len = a.chars().count().max(b.chars().count());
    let threshold = distance_threshold(len);
    let distance = levenshtein(a, b);

    let accepted = distance <= threshold
        || multiset_difference(a, b) <= threshold.min(2)
        || a.contains(b)
        || b.contains(a);
    accepted.then_some(distance)
}

/// Best fuzzy candidate for a raw segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch<'a> {
    pub id: &'a str,
    pub synonym: &'a str,
    pub distance: usize,
}

/// Ranks every accepted alias of the index against `raw`.
pub fn best_match<'a>(index: &'a SynonymIndex, raw: &str) -> Option<FuzzyMatch<'a>> {
    let token = normalize_token(raw);
    if token.is_empty() {
        return None;
    }

    let mut best: Option<FuzzyMatch<'a>> = None;
    for entry in index.entries() {
        let Some(distance) = token_match(&token, &entry.token) else {
            continue;
        };
        let candidate = FuzzyMatch {
            id: entry.id.as_str(),
            synonym: entry.token.as_str(),
            distance,
        };
        // Strict comparison keeps the earlier registration on ties.
        let better = match &best {
            None => true,
            Some(current) => {
                (candidate.distance, candidate.synonym.chars().count())
                    < (current.distance, current.synonym.chars().count())
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Resolves the first usable segment: exact lookups over every segment
/// in order, then fuzzy lookups in the same order.
pub fn resolve_segments<'a>(index: &'a SynonymIndex, segments: &[&str]) -> Option<&'a str> {
    segments
        .iter()
        .find_map(|segment| index.resolve(segment))
        .or_else(|| {
            segments
                .iter()
                .find_map(|segment| best_match(index, segment).map(|m| m.id))
        })
}
