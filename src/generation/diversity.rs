//! Diversity guard: near-duplicate detection within one run via token-set Jaccard.

use crate::record::IdeaRecord;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Similarity at or above which a candidate counts as a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.82;

/// Lowercased, accent-folded word set of a piece of text.
pub fn normalized_tokens(text: &str) -> HashSet<String> {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().map(str::to_string).collect()
}

/// Tokens of the fields that carry an idea's identity: title, hook and script.
pub fn record_tokens(record: &IdeaRecord) -> HashSet<String> {
    normalized_tokens(&format!(
        "{} {} {}",
        record.idea_title, record.hook, record.script
    ))
}

/// |a ∩ b| / |a ∪ b|; 1.0 when both are empty, 0.0 when exactly one is.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Highest similarity between `candidate` and any accepted record; 0.0 with none.
pub fn max_similarity(candidate: &IdeaRecord, accepted: &[IdeaRecord]) -> f64 {
    let tokens = record_tokens(candidate);
    accepted
        .iter()
        .map(|other| jaccard(&tokens, &record_tokens(other)))
        .fold(0.0, f64::max)
}

pub fn is_duplicate(candidate: &IdeaRecord, accepted: &[IdeaRecord], threshold: f64) -> bool {
    max_similarity(candidate, accepted) >= threshold
}
