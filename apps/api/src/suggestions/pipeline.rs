//! Suggestion pipeline: produce → validate → dedup → score → MMR → RRF → offer,
//! one suggestion at a time per (job_id, category).
//!
//! Each scope owns a `tokio::sync::Mutex<ScopeState>` held for the whole of
//! `next_suggestion`, `accept` and `reject`, so calls on one scope run in
//! arrival order while distinct scopes proceed concurrently. History and
//! quota are only written after the last `.await` of a request: a dropped
//! request leaves them untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::format::{parse_amot, AmotParts};
use crate::ranking::keywords::{extract_keywords, rank_by_overlap};
use crate::ranking::similarity::normalize;
use crate::ranking::{mmr, rrf};
use crate::store::{
    AcceptedBullet, AcceptedStore, HistoryStore, QuotaError, QuotaState, QuotaTracker, ScopeKey,
};
use crate::suggestions::models::{
    GenerationContext, JobProgress, NextSuggestion, OfferedSuggestion, ScopeState,
};
use crate::suggestions::producer::CandidateProducer;
use crate::suggestions::scorer::{validate_scores, RelevanceScorer};
use crate::suggestions::upstream::{call_with_retry, UpstreamError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("candidate producer failed: {0}")]
    ProducerFailure(#[source] UpstreamError),

    #[error("relevance scorer failed: {0}")]
    ScorerFailure(#[source] UpstreamError),

    #[error("'{text}' is not the suggestion currently offered for {scope}")]
    StaleSuggestion { scope: String, text: String },

    #[error("no suggestion session for {0}")]
    UnknownScope(String),

    #[error(transparent)]
    Quota(#[from] QuotaError),
}

/// A candidate that passed format validation and history dedup.
#[derive(Debug, Clone)]
struct Candidate {
    text: String,
    components: AmotParts,
}

type Session = Arc<AsyncMutex<ScopeState>>;

pub struct SuggestionPipeline {
    producer: Arc<dyn CandidateProducer>,
    scorer: Arc<dyn RelevanceScorer>,
    history: Arc<HistoryStore>,
    quotas: Arc<QuotaTracker>,
    accepted: AcceptedStore,
    settings: PipelineSettings,
    /// Live scopes only; a scope whose quota is met gives its session up.
    sessions: Mutex<HashMap<ScopeKey, Session>>,
}

impl SuggestionPipeline {
    pub fn new(
        producer: Arc<dyn CandidateProducer>,
        scorer: Arc<dyn RelevanceScorer>,
        history: Arc<HistoryStore>,
        quotas: Arc<QuotaTracker>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            producer,
            scorer,
            history,
            quotas,
            accepted: AcceptedStore::new(),
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn session(&self, scope: &ScopeKey) -> Session {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(scope.clone()).or_default())
    }

    /// Session for an accept or reject. A scope that already met its quota
    /// has released its session, so a decision on it is stale rather than
    /// unknown.
    fn decision_session(&self, scope: &ScopeKey, text: &str) -> Result<Session, PipelineError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get(scope) {
            return Ok(Arc::clone(session));
        }
        if self.completed_quota(scope).is_some() {
            return Err(PipelineError::StaleSuggestion {
                scope: scope.to_string(),
                text: text.to_string(),
            });
        }
        Err(PipelineError::UnknownScope(scope.to_string()))
    }

    fn release_session(&self, scope: &ScopeKey) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if sessions.remove(scope).is_some() {
            debug!("Released session for {scope}");
        }
    }

    fn completed_quota(&self, scope: &ScopeKey) -> Option<QuotaState> {
        self.quotas.progress(scope).filter(|q| q.complete)
    }

    /// Accepted bullets of a job, grouped by category.
    pub fn accepted(&self, job_id: &str) -> BTreeMap<String, Vec<AcceptedBullet>> {
        self.accepted.for_job(job_id)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Quotas
    // ────────────────────────────────────────────────────────────────────────

    pub fn configure_quota(
        &self,
        job_id: &str,
        category: &str,
        target: u32,
    ) -> Result<QuotaState, PipelineError> {
        Ok(self.quotas.configure(&ScopeKey::new(job_id, category), target)?)
    }

    /// Configured categories of a job plus any category with a configured
    /// default target, as well as `expected` categories named by the caller.
    /// A category that has not been configured yet is reported at 0 and
    /// counts as incomplete.
    pub fn progress(&self, job_id: &str, expected: &[String]) -> JobProgress {
        let mut categories = self.quotas.job_progress(job_id);
        let pending = self
            .settings
            .category_quotas
            .keys()
            .chain(expected.iter())
            .filter(|c| !c.trim().is_empty());
        for category in pending {
            categories
                .entry(category.clone())
                .or_insert_with(|| QuotaState {
                    accepted_count: 0,
                    target: self.settings.default_target(category),
                    complete: false,
                });
        }

        let names: Vec<&String> = categories.keys().collect();
        let all_complete = !names.is_empty() && self.quotas.all_complete(job_id, &names);
        JobProgress {
            categories,
            all_complete,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // next_suggestion
    // ────────────────────────────────────────────────────────────────────────

    pub async fn next_suggestion(
        &self,
        job_id: &str,
        category: &str,
        ctx: &GenerationContext,
    ) -> Result<NextSuggestion, PipelineError> {
        let scope = ScopeKey::new(job_id, category);
        if let Some(quota) = self.completed_quota(&scope) {
            return Ok(NextSuggestion::Complete { quota });
        }

        let session = self.session(&scope);
        let mut state = session.lock().await;

        // the quota may have been met while this request waited for the lock
        if let Some(quota) = self.completed_quota(&scope) {
            *state = ScopeState::Complete;
            self.release_session(&scope);
            return Ok(NextSuggestion::Complete { quota });
        }

        if let ScopeState::Offered(offer) = &*state {
            debug!("Re-sending outstanding offer {} for {scope}", offer.suggestion_id);
            return Ok(NextSuggestion::Offered(offer.clone()));
        }

        *state = ScopeState::Generating;

        let keywords = if ctx.keywords.is_empty() {
            extract_keywords(&ctx.job_description, self.settings.keyword_top_n)
        } else {
            ctx.keywords.clone()
        };

        let attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=attempts {
            let raw = self.produce(ctx, category).await?;
            let survivors = self.filter_candidates(&scope, raw);
            if survivors.is_empty() {
                warn!("Generation round {attempt}/{attempts} for {scope} left no usable candidates");
                continue;
            }

            let Some((chosen, relevance)) = self.rank(ctx, &keywords, &survivors).await? else {
                continue;
            };
            let candidate = &survivors[chosen];

            let offer = OfferedSuggestion {
                suggestion_id: Uuid::new_v4(),
                text: candidate.text.clone(),
                components: candidate.components.clone(),
                score_1_to_10: rrf::ui_score(relevance),
                relevance_score: relevance,
                producer_id: self.producer.id().to_string(),
                offered_at: Utc::now(),
            };

            // no .await past this point
            self.quotas
                .ensure(&scope, self.settings.default_target(category))?;
            self.history.record(&scope, &offer.text);
            info!(
                "Offered {} for {scope} (score {}/10): {}",
                offer.suggestion_id, offer.score_1_to_10, offer.text
            );
            *state = ScopeState::Offered(offer.clone());
            return Ok(NextSuggestion::Offered(offer));
        }

        warn!("Generation exhausted for {scope} after {attempts} rounds");
        Ok(NextSuggestion::Exhausted { attempts })
    }

    async fn produce(
        &self,
        ctx: &GenerationContext,
        category: &str,
    ) -> Result<Vec<String>, PipelineError> {
        let producer = self.producer.as_ref();
        let batch_size = self.settings.batch_size;
        call_with_retry("candidate producer", &self.settings.retry, move || {
            producer.produce(ctx, category, batch_size)
        })
        .await
        .map_err(PipelineError::ProducerFailure)
    }

    /// Drops candidates that fail the AMOT contract, repeat history, or repeat
    /// another candidate in the same batch.
    fn filter_candidates(&self, scope: &ScopeKey, raw: Vec<String>) -> Vec<Candidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut survivors = Vec::new();

        for text in raw {
            let text = text.trim().to_string();
            let components = match parse_amot(&text) {
                Ok(parts) => parts,
                Err(reason) => {
                    debug!("FormatRejected for {scope} ({reason}): {text}");
                    continue;
                }
            };
            if self.history.is_near_duplicate(scope, &text) {
                debug!("DuplicateRejected for {scope}: {text}");
                continue;
            }
            if !seen.insert(normalize(&text)) {
                debug!("DuplicateRejected within batch for {scope}: {text}");
                continue;
            }
            survivors.push(Candidate { text, components });
        }

        survivors
    }

    /// Scores, diversifies and fuses the survivors. Returns the index of the
    /// winner and its raw relevance.
    async fn rank(
        &self,
        ctx: &GenerationContext,
        keywords: &[String],
        candidates: &[Candidate],
    ) -> Result<Option<(usize, f64)>, PipelineError> {
        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let query = ctx.query();

        let scorer = self.scorer.as_ref();
        let (query_ref, texts_ref) = (query.as_str(), texts.as_slice());
        let relevance = call_with_retry("relevance scorer", &self.settings.retry, move || async move {
            let scores = scorer.score(query_ref, texts_ref).await?;
            validate_scores(&scores, texts_ref.len())?;
            Ok::<_, UpstreamError>(scores)
        })
        .await
        .map_err(PipelineError::ScorerFailure)?;

        let scored: Vec<(&str, f64)> = texts
            .iter()
            .map(String::as_str)
            .zip(relevance.iter().copied())
            .collect();
        let k = match self.settings.mmr_top_k {
            0 => scored.len(),
            k => k.min(scored.len()),
        };
        let mmr_order = mmr::select(&scored, self.settings.mmr_lambda, k);

        let mmr_texts: Vec<&str> = mmr_order.iter().map(|&i| scored[i].0).collect();
        let keyword_order: Vec<usize> = rank_by_overlap(&mmr_texts, keywords)
            .into_iter()
            .map(|j| mmr_order[j])
            .collect();

        let fused = rrf::fuse(&[&mmr_order[..], &keyword_order[..]], rrf::RRF_K);
        Ok(fused.first().map(|f| (f.key, relevance[f.key])))
    }

    // ────────────────────────────────────────────────────────────────────────
    // accept / reject
    // ────────────────────────────────────────────────────────────────────────

    pub async fn accept(
        &self,
        job_id: &str,
        category: &str,
        text: &str,
        suggestion_id: Option<Uuid>,
    ) -> Result<QuotaState, PipelineError> {
        let scope = ScopeKey::new(job_id, category);
        let session = self.decision_session(&scope, text)?;
        let mut state = session.lock().await;

        let offer = current_offer(&state, &scope, text, suggestion_id)?;
        self.history.record(&scope, &offer.text);
        let quota = self.quotas.accept(&scope)?;
        info!(
            "Accepted {} for {scope} ({}/{})",
            offer.suggestion_id, quota.accepted_count, quota.target
        );
        self.accepted.push(
            &scope,
            AcceptedBullet {
                suggestion_id: offer.suggestion_id,
                text: offer.text,
                components: offer.components,
                accepted_at: Utc::now(),
            },
        );

        if quota.complete {
            *state = ScopeState::Complete;
            self.release_session(&scope);
        } else {
            *state = ScopeState::Accepted;
        }
        Ok(quota)
    }

    pub async fn reject(
        &self,
        job_id: &str,
        category: &str,
        text: &str,
        suggestion_id: Option<Uuid>,
    ) -> Result<(), PipelineError> {
        let scope = ScopeKey::new(job_id, category);
        let session = self.decision_session(&scope, text)?;
        let mut state = session.lock().await;

        let offer = current_offer(&state, &scope, text, suggestion_id)?;
        self.history.record(&scope, &offer.text);

        info!("Rejected {} for {scope}", offer.suggestion_id);
        *state = ScopeState::Rejected;
        Ok(())
    }
}

fn current_offer(
    state: &ScopeState,
    scope: &ScopeKey,
    text: &str,
    suggestion_id: Option<Uuid>,
) -> Result<OfferedSuggestion, PipelineError> {
    match state {
        ScopeState::Offered(offer) if offer.matches(text, suggestion_id) => Ok(offer.clone()),
        other => {
            warn!(
                "Stale accept/reject for {scope} while {}: {text}",
                other.name()
            );
            Err(PipelineError::StaleSuggestion {
                scope: scope.to_string(),
                text: text.to_string(),
            })
        }
    }
}
