//! Relevance scorer: pluggable, trait-based scoring of candidates against the
//! job context, one score in [0, 1] per candidate, same order as the input.
//!
//! - `CohereRelevanceScorer`: semantic rerank API, used when a key is configured.
//! - `LexicalRelevanceScorer`: pure-Rust fallback, deterministic, no network.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ranking::keywords::{extract_keywords, overlap_score, DEFAULT_TOP_N};
use crate::ranking::similarity::similarity;
use crate::suggestions::upstream::UpstreamError;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f64>, UpstreamError>;
}

/// Rejects short, padded or out-of-range score vectors. Never zero-fills.
pub fn validate_scores(scores: &[f64], expected: usize) -> Result<(), UpstreamError> {
    if scores.len() != expected {
        return Err(UpstreamError::MalformedResponse(format!(
            "expected {expected} scores, got {}",
            scores.len()
        )));
    }
    if let Some((i, s)) = scores
        .iter()
        .enumerate()
        .find(|(_, s)| !(0.0..=1.0).contains(*s))
    {
        return Err(UpstreamError::MalformedResponse(format!(
            "score {s} at index {i} is outside [0, 1]"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// CohereRelevanceScorer
// ────────────────────────────────────────────────────────────────────────────

const COHERE_RERANK_URL: &str = "https://api.cohere.com/v2/rerank";
pub const RERANK_MODEL: &str = "rerank-english-v3.0";

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f64,
}

pub struct CohereRelevanceScorer {
    client: Client,
    api_key: String,
}

impl CohereRelevanceScorer {
    pub fn new(api_key: String) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: Client::builder().build()?,
            api_key,
        })
    }
}

/// Puts rerank results (sorted by relevance) back into input order.
/// Every input index must appear exactly once.
fn scores_in_input_order(results: &[RerankResult], n: usize) -> Result<Vec<f64>, UpstreamError> {
    let mut scores: Vec<Option<f64>> = vec![None; n];
    for r in results {
        let slot = scores.get_mut(r.index).ok_or_else(|| {
            UpstreamError::MalformedResponse(format!("rerank index {} out of range", r.index))
        })?;
        if slot.replace(r.relevance_score).is_some() {
            return Err(UpstreamError::MalformedResponse(format!(
                "rerank index {} returned twice",
                r.index
            )));
        }
    }
    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or_else(|| UpstreamError::MalformedResponse(format!("no score for index {i}")))
        })
        .collect()
}

#[async_trait]
impl RelevanceScorer for CohereRelevanceScorer {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f64>, UpstreamError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let body = RerankRequest {
            model: RERANK_MODEL,
            query,
            documents: candidates,
            top_n: candidates.len(),
        };

        let response = self
            .client
            .post(COHERE_RERANK_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RerankResponse = response.json().await?;
        let scores = scores_in_input_order(&parsed.results, candidates.len())?;
        debug!("Rerank scored {} candidates", scores.len());
        Ok(scores)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LexicalRelevanceScorer
// ────────────────────────────────────────────────────────────────────────────

const KEYWORD_WEIGHT: f64 = 0.7;
const TRIGRAM_WEIGHT: f64 = 0.3;

/// `0.7 · keyword overlap + 0.3 · trigram similarity` against the query.
pub struct LexicalRelevanceScorer;

#[async_trait]
impl RelevanceScorer for LexicalRelevanceScorer {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f64>, UpstreamError> {
        let keywords = extract_keywords(query, DEFAULT_TOP_N);
        Ok(candidates
            .iter()
            .map(|c| {
                let blended = KEYWORD_WEIGHT * overlap_score(c, &keywords)
                    + TRIGRAM_WEIGHT * similarity(c, query);
                blended.clamp(0.0, 1.0)
            })
            .collect())
    }
}
