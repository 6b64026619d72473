//! Character-trigram Jaccard similarity.
//!
//! Used twice with different cut-offs: against history for deduplication
//! (`DUPLICATE_THRESHOLD`) and inside MMR for hard diversity suppression
//! (`DIVERSITY_CUTOFF`).

use std::collections::HashSet;

/// At or above this score a candidate is a near-duplicate of a history entry.
pub const DUPLICATE_THRESHOLD: f64 = 0.85;

/// At or above this score an MMR candidate is dropped for the rest of the pass.
pub const DIVERSITY_CUTOFF: f64 = 0.90;

/// Lower-cases, collapses whitespace runs to a single space and trims.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct 3-character windows of the normalised text. Empty below 3 chars.
pub fn trigrams(text: &str) -> HashSet<String> {
    let chars: Vec<char> = normalize(text).chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

/// `|A ∩ B| / |A ∪ B|` over trigram sets, in [0, 1].
///
/// Two empty sets score 0.0, never 1.0, so short strings cannot collide.
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&trigrams(a), &trigrams(b))
}

/// Jaccard index over pre-computed trigram sets.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}
