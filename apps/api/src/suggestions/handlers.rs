//! Axum route handlers for the suggestion and validation APIs.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::format::{parse_amot, parse_skills_line, AmotError, AmotParts, SkillsLine};
use crate::store::history::HistoryEntry;
use crate::store::{AcceptedBullet, QuotaState, ScopeKey};
use crate::suggestions::models::{GenerationContext, JobProgress, NextSuggestion};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub text: String,
    #[serde(default)]
    pub suggestion_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Comma-separated categories that must be complete for `all_complete`.
    #[serde(default)]
    pub categories: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureQuotasRequest {
    pub quotas: BTreeMap<String, u32>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateAmotRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateAmotResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<AmotParts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AmotError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateSkillsRequest {
    pub line: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateSkillsResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<SkillsLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:job_id/categories/:category/next
///
/// Returns the outstanding offer, a new offer, or a complete/exhausted status.
pub async fn handle_next(
    State(state): State<AppState>,
    Path((job_id, category)): Path<(String, String)>,
    Json(ctx): Json<GenerationContext>,
) -> Result<Json<NextSuggestion>, AppError> {
    require_non_empty("job_description", &ctx.job_description)?;

    let next = state
        .pipeline
        .next_suggestion(&job_id, &category, &ctx)
        .await?;
    Ok(Json(next))
}

/// POST /api/v1/jobs/:job_id/categories/:category/accept
pub async fn handle_accept(
    State(state): State<AppState>,
    Path((job_id, category)): Path<(String, String)>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<QuotaState>, AppError> {
    require_non_empty("text", &request.text)?;

    let quota = state
        .pipeline
        .accept(&job_id, &category, &request.text, request.suggestion_id)
        .await?;
    Ok(Json(quota))
}

/// POST /api/v1/jobs/:job_id/categories/:category/reject
///
/// The caller is expected to request `next` straight after.
pub async fn handle_reject(
    State(state): State<AppState>,
    Path((job_id, category)): Path<(String, String)>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Value>, AppError> {
    require_non_empty("text", &request.text)?;

    state
        .pipeline
        .reject(&job_id, &category, &request.text, request.suggestion_id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/v1/jobs/:job_id/categories/:category/history
///
/// Every text already shown for the scope, oldest first.
pub async fn handle_history(
    State(state): State<AppState>,
    Path((job_id, category)): Path<(String, String)>,
) -> Json<Vec<HistoryEntry>> {
    let scope = ScopeKey::new(job_id, category);
    Json(state.pipeline.history().entries(&scope))
}

/// GET /api/v1/jobs/:job_id/accepted
///
/// Accepted bullets per category, as offered and in acceptance order.
pub async fn handle_accepted(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<BTreeMap<String, Vec<AcceptedBullet>>> {
    Json(state.pipeline.accepted(&job_id))
}

/// GET /api/v1/jobs/:job_id/progress?categories=a,b
pub async fn handle_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> Json<JobProgress> {
    let expected: Vec<String> = query
        .categories
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    Json(state.pipeline.progress(&job_id, &expected))
}

/// POST /api/v1/jobs/:job_id/quotas
///
/// Targets are checked before any is applied; a conflict with an existing
/// target is a 409.
pub async fn handle_configure_quotas(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<ConfigureQuotasRequest>,
) -> Result<Json<BTreeMap<String, QuotaState>>, AppError> {
    if request.quotas.is_empty() {
        return Err(AppError::Validation("quotas cannot be empty".to_string()));
    }
    for (category, target) in &request.quotas {
        require_non_empty("category", category)?;
        if *target == 0 {
            return Err(AppError::Validation(format!(
                "target for '{category}' must be at least 1"
            )));
        }
    }

    let mut configured = BTreeMap::new();
    for (category, target) in request.quotas {
        let quota = state.pipeline.configure_quota(&job_id, &category, target)?;
        configured.insert(category, quota);
    }
    Ok(Json(configured))
}

// ────────────────────────────────────────────────────────────────────────────
// Format validation handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/validate/amot
pub async fn handle_validate_amot(
    Json(request): Json<ValidateAmotRequest>,
) -> Json<ValidateAmotResponse> {
    let response = match parse_amot(&request.text) {
        Ok(parts) => ValidateAmotResponse {
            matched: true,
            components: Some(parts),
            reason: None,
            message: None,
        },
        Err(reason) => ValidateAmotResponse {
            matched: false,
            components: None,
            message: Some(reason.to_string()),
            reason: Some(reason),
        },
    };
    Json(response)
}

/// POST /api/v1/validate/skills
pub async fn handle_validate_skills(
    Json(request): Json<ValidateSkillsRequest>,
) -> Json<ValidateSkillsResponse> {
    let response = match parse_skills_line(&request.line) {
        Ok(line) => ValidateSkillsResponse {
            matched: true,
            components: Some(line),
            reason: None,
            message: None,
        },
        Err(err) => ValidateSkillsResponse {
            matched: false,
            components: None,
            reason: Some(err.code()),
            message: Some(err.to_string()),
        },
    };
    Json(response)
}
