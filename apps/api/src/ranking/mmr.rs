//! Maximal Marginal Relevance: greedy diverse top-K selection.
//!
//! `MMR(c) = λ · relevance(c) − (1 − λ) · max_{s ∈ selected} sim(c, s)`
//!
//! Candidates whose similarity to any selected item reaches
//! `DIVERSITY_CUTOFF` are dropped for the rest of the pass.

use std::collections::HashSet;

use crate::ranking::similarity::{jaccard, trigrams, DIVERSITY_CUTOFF};

pub const DEFAULT_LAMBDA: f64 = 0.7;

/// Returns indices into `candidates` in selection order (first = highest priority).
///
/// Each candidate is `(text, relevance)`. At most `k` indices are returned.
/// Ties on MMR score go to the higher raw relevance, then to input order,
/// so the output is fully deterministic.
pub fn select<T: AsRef<str>>(candidates: &[(T, f64)], lambda: f64, k: usize) -> Vec<usize> {
    let lambda = lambda.clamp(0.0, 1.0);
    let grams: Vec<HashSet<String>> = candidates
        .iter()
        .map(|(text, _)| trigrams(text.as_ref()))
        .collect();

    // (index, max similarity to anything selected so far), kept in input order
    let mut remaining: Vec<(usize, f64)> = (0..candidates.len()).map(|i| (i, 0.0)).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best: Option<(usize, f64, f64)> = None; // (slot in remaining, mmr, relevance)

        for (slot, &(idx, max_sim)) in remaining.iter().enumerate() {
            let relevance = candidates[idx].1;
            let score = lambda * relevance - (1.0 - lambda) * max_sim;
            let better = match best {
                None => true,
                Some((_, best_score, best_rel)) => {
                    score > best_score || (score == best_score && relevance > best_rel)
                }
            };
            if better {
                best = Some((slot, score, relevance));
            }
        }

        let Some((slot, _, _)) = best else { break };
        let (chosen, _) = remaining.remove(slot);
        selected.push(chosen);

        remaining.retain_mut(|(idx, max_sim)| {
            let sim = jaccard(&grams[*idx], &grams[chosen]);
            if sim >= DIVERSITY_CUTOFF {
                return false;
            }
            if sim > *max_sim {
                *max_sim = sim;
            }
            true
        });
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::similarity::similarity;

    const CLUSTER_BASE: &str =
        "Improved checkout service throughput by 35% which reduced p99 latency using Rust and Tokio";

    fn diverse() -> Vec<&'static str> {
        vec![
            "Automated invoice reconciliation for 1,200 vendors and cut processing time using Airflow",
            "Migrated 14 legacy services to Kubernetes and accelerated release cadence via ArgoCD",
            "Designed fraud scoring model across 3 regions that saved $2M annually with XGBoost",
            "Streamlined onboarding for 40 engineers which boosted retention using Notion",
            "Redesigned search indexing across 8 clusters and increased query throughput via Elasticsearch",
        ]
    }

    fn cluster() -> Vec<String> {
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| format!("{CLUSTER_BASE} {s}"))
            .collect()
    }

    #[test]
    fn test_cluster_is_near_duplicate() {
        let c = cluster();
        for a in &c {
            for b in &c {
                assert!(similarity(a, b) >= DIVERSITY_CUTOFF);
            }
        }
    }

    #[test]
    fn test_selects_at_most_one_from_duplicate_cluster() {
        let c = cluster();
        let mut candidates: Vec<(String, f64)> = c.iter().map(|t| (t.clone(), 0.9)).collect();
        for (i, t) in diverse().into_iter().enumerate() {
            candidates.push((t.to_string(), 0.5 + i as f64 * 0.02));
        }

        let picked = select(&candidates, 0.7, 5);
        assert_eq!(picked.len(), 5);
        let from_cluster = picked.iter().filter(|&&i| i < 5).count();
        assert_eq!(from_cluster, 1, "picked {picked:?}");
        assert_eq!(picked[0], 0, "highest relevance, first seen");
        assert!(picked.iter().any(|&i| i >= 5));
    }

    #[test]
    fn test_repeated_runs_identical() {
        let candidates: Vec<(&str, f64)> = diverse().into_iter().map(|t| (t, 0.5)).collect();
        let first = select(&candidates, 0.7, 5);
        for _ in 0..10 {
            assert_eq!(select(&candidates, 0.7, 5), first);
        }
    }

    #[test]
    fn test_full_tie_keeps_input_order_first() {
        let candidates: Vec<(&str, f64)> = diverse().into_iter().map(|t| (t, 0.5)).collect();
        let picked = select(&candidates, 0.7, 5);
        assert_eq!(picked[0], 0);
    }

    #[test]
    fn test_lambda_one_is_pure_relevance_order() {
        let candidates = vec![
            (diverse()[0], 0.2),
            (diverse()[1], 0.9),
            (diverse()[2], 0.5),
        ];
        assert_eq!(select(&candidates, 1.0, 3), vec![1, 2, 0]);
    }

    #[test]
    fn test_k_limits_output() {
        let candidates: Vec<(&str, f64)> = diverse().into_iter().map(|t| (t, 0.5)).collect();
        assert_eq!(select(&candidates, 0.7, 2).len(), 2);
        assert!(select(&candidates, 0.7, 0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let candidates: Vec<(&str, f64)> = vec![];
        assert!(select(&candidates, 0.7, 5).is_empty());
    }

    #[test]
    fn test_similarity_penalty_reorders() {
        // b is slightly more relevant than c but nearly a copy of a
        let a = "Improved checkout service throughput by 35% which reduced latency using Rust";
        let b = "Improved checkout service throughput by 30% which reduced errors using Rust";
        let c = "Designed fraud scoring model across 3 regions that saved $2M annually with XGBoost";
        let candidates = vec![(a, 0.9), (b, 0.85), (c, 0.8)];
        assert!(similarity(a, b) < DIVERSITY_CUTOFF);
        assert_eq!(select(&candidates, 0.7, 3), vec![0, 2, 1]);
    }
}
