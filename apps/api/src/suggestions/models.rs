// Request, state and response types for the suggestion pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::AmotParts;
use crate::store::QuotaState;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// What the producer writes against and what relevance is scored against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    pub job_description: String,
    #[serde(default)]
    pub role_summary: Option<String>,
    /// Explicit keywords take precedence over ones extracted from the job text.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl GenerationContext {
    /// Query text handed to the relevance scorer.
    pub fn query(&self) -> String {
        match self.role_summary.as_deref().map(str::trim) {
            Some(summary) if !summary.is_empty() => {
                format!("{}\n\n{}", self.job_description.trim(), summary)
            }
            _ => self.job_description.trim().to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-scope state machine
// ────────────────────────────────────────────────────────────────────────────

/// `AwaitingRequest → Generating → Offered → {Accepted | Rejected}`, then back
/// to `Generating` on the next request, or `Complete` once the quota is met.
#[derive(Debug, Clone, Default)]
pub enum ScopeState {
    #[default]
    AwaitingRequest,
    Generating,
    Offered(OfferedSuggestion),
    Accepted,
    Rejected,
    Complete,
}

impl ScopeState {
    pub fn name(&self) -> &'static str {
        match self {
            ScopeState::AwaitingRequest => "awaiting_request",
            ScopeState::Generating => "generating",
            ScopeState::Offered(_) => "offered",
            ScopeState::Accepted => "accepted",
            ScopeState::Rejected => "rejected",
            ScopeState::Complete => "complete",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferedSuggestion {
    pub suggestion_id: Uuid,
    pub text: String,
    pub components: AmotParts,
    pub score_1_to_10: u8,
    pub relevance_score: f64,
    pub producer_id: String,
    pub offered_at: DateTime<Utc>,
}

impl OfferedSuggestion {
    /// Text must match exactly (modulo surrounding whitespace); an id, when
    /// the caller sends one, must match as well.
    pub fn matches(&self, text: &str, suggestion_id: Option<Uuid>) -> bool {
        self.text == text.trim() && suggestion_id.map_or(true, |id| id == self.suggestion_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextSuggestion {
    Offered(OfferedSuggestion),
    Complete { quota: QuotaState },
    /// No valid, non-duplicate candidate after every generation round.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct JobProgress {
    pub categories: BTreeMap<String, QuotaState>,
    pub all_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> OfferedSuggestion {
        OfferedSuggestion {
            suggestion_id: Uuid::new_v4(),
            text: "Improved data pipeline by 35% which reduced latency using Python".into(),
            components: AmotParts {
                action: "Improved".into(),
                metric: "35%".into(),
                outcome: "reduced latency".into(),
                tool: "using Python".into(),
            },
            score_1_to_10: 7,
            relevance_score: 0.7,
            producer_id: "stub".into(),
            offered_at: Utc::now(),
        }
    }

    #[test]
    fn test_query_includes_role_summary() {
        let ctx = GenerationContext {
            job_description: " Data engineer ".into(),
            role_summary: Some("Led ingestion at Acme".into()),
            keywords: vec![],
        };
        assert_eq!(ctx.query(), "Data engineer\n\nLed ingestion at Acme");

        let bare = GenerationContext {
            role_summary: Some("  ".into()),
            ..ctx
        };
        assert_eq!(bare.query(), "Data engineer");
    }

    #[test]
    fn test_offer_matching() {
        let o = offer();
        assert!(o.matches(&format!("  {}  ", o.text), None));
        assert!(o.matches(&o.text, Some(o.suggestion_id)));
        assert!(!o.matches(&o.text, Some(Uuid::new_v4())));
        assert!(!o.matches("Something else entirely", None));
    }

    #[test]
    fn test_next_suggestion_serializes_with_status_tag() {
        let json = serde_json::to_value(NextSuggestion::Offered(offer())).unwrap();
        assert_eq!(json["status"], "offered");
        assert_eq!(json["score_1_to_10"], 7);
        assert_eq!(json["components"]["metric"], "35%");

        let json = serde_json::to_value(NextSuggestion::Exhausted { attempts: 3 }).unwrap();
        assert_eq!(json["status"], "exhausted");
        assert_eq!(json["attempts"], 3);
    }
}
