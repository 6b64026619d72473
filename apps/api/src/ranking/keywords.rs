//! Keyword signal, the locally computed ranking fused with external relevance.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::ranking::similarity::normalize;

/// Overlap score used when there are no keywords to match against.
pub const NEUTRAL_OVERLAP: f64 = 0.5;

pub const DEFAULT_TOP_N: usize = 15;

const STOPWORDS: &[&str] = &[
    "the", "and", "or", "is", "are", "was", "were", "will", "be", "to", "of", "in", "for", "on",
    "with", "at", "by", "from", "as", "an", "a", "this", "that", "these", "those", "it", "its",
    "they", "them", "their", "we", "our", "you", "your", "have", "has", "been", "into", "about",
    "also", "such", "than", "then", "when", "what", "which", "while", "must", "should", "would",
    "could", "able", "more", "most", "other", "some", "well", "work", "including",
];

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("keyword pattern is a valid regex"))
}

/// Top `top_n` significant words of `text` by frequency.
///
/// Significant = 4+ ASCII letters, not a stop word. Ties keep first appearance.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let stop: HashSet<&str> = STOPWORDS.iter().copied().collect();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new(); // word -> (count, first_pos)
    for (pos, m) in word_re().find_iter(&lower).enumerate() {
        let word = m.as_str();
        if stop.contains(word) {
            continue;
        }
        counts.entry(word).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(w, (c, p))| (w, c, p)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(w, _, _)| w.to_string())
        .collect()
}

/// Fraction of `keywords` present in `text`, in [0, 1].
///
/// Single-word keywords must match a whole token; multi-word keywords match
/// as a phrase in the normalised text.
pub fn overlap_score(text: &str, keywords: &[String]) -> f64 {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return NEUTRAL_OVERLAP;
    }

    let normalized = normalize(text);
    let tokens: HashSet<&str> = normalized
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|t| !t.is_empty())
        .collect();

    let matched = keywords
        .iter()
        .filter(|kw| {
            if kw.contains(' ') {
                normalized.contains(kw.as_str())
            } else {
                tokens.contains(kw.as_str())
            }
        })
        .count();

    matched as f64 / keywords.len() as f64
}

/// Indices of `texts` ordered by keyword overlap, highest first.
/// Equal scores keep the incoming order.
pub fn rank_by_overlap<T: AsRef<str>>(texts: &[T], keywords: &[String]) -> Vec<usize> {
    let scores: Vec<f64> = texts
        .iter()
        .map(|t| overlap_score(t.as_ref(), keywords))
        .collect();
    let mut order: Vec<usize> = (0..texts.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}
