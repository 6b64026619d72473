//! Reciprocal Rank Fusion: `RRF(c) = Σ_r 1 / (k + rank_r(c))`, ranks 1-indexed.
//!
//! A candidate missing from a ranking contributes nothing for that ranking.

use std::collections::HashMap;
use std::hash::Hash;

/// Standard damping constant.
pub const RRF_K: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused<K> {
    pub key: K,
    pub score: f64,
}

/// Fuses several orderings of the same keys into one consensus ordering,
/// highest score first.
///
/// Equal scores keep first-seen order (scanning rankings in the order given),
/// which makes the first ranking the tie-breaker.
pub fn fuse<K: Copy + Eq + Hash>(rankings: &[&[K]], k: f64) -> Vec<Fused<K>> {
    let mut order: Vec<K> = Vec::new();
    let mut scores: HashMap<K, f64> = HashMap::new();

    for ranking in rankings {
        for (pos, key) in ranking.iter().enumerate() {
            let contribution = 1.0 / (k + (pos + 1) as f64);
            match scores.get_mut(key) {
                Some(score) => *score += contribution,
                None => {
                    scores.insert(*key, contribution);
                    order.push(*key);
                }
            }
        }
    }

    let mut fused: Vec<Fused<K>> = order
        .into_iter()
        .map(|key| Fused {
            key,
            score: scores[&key],
        })
        .collect();

    // sort_by is stable, so ties stay in first-seen order
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused
}

/// Maps a relevance in [0, 1] to the 1–10 score shown to users.
///
/// The displayed score always comes from raw relevance; fused rank only
/// decides order.
pub fn ui_score(relevance: f64) -> u8 {
    if !relevance.is_finite() {
        return 1;
    }
    (1.0 + 9.0 * relevance).round().clamp(1.0, 10.0) as u8
}
