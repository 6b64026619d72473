//! AMOT contract. Every suggested bullet is one line carrying, in order,
//! an Action verb, a numeric Metric, an Outcome phrase and the Tool used.
//!
//! Example: "Improved data pipeline by 35% which reduced latency using Python"
//!   action  = "Improved"
//!   metric  = "35%"
//!   outcome = "reduced latency"
//!   tool    = "using Python"

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capitalised verb ending in -ed / -ing at line start.
const ACTION: &str = r"^(?P<action>[A-Z][a-zA-Z]+(?:ed|ing))\b";
/// 1,200 | 1200 | 3.5 | 35%; comma groups only in groups of three.
const METRIC: &str = r"\b(?P<metric>(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:%|\b))";
/// Closed set of impact verbs, running up to the next `.` or `;`.
const OUTCOME: &str = r"\b(?P<outcome>(?i:reduced|increased|improved|decreased|accelerated|cut|boosted|saved|grew|drove)\b[^.;]*)";
/// using / with / via followed by tool tokens, optional trailing period.
const TOOL: &str = r"\b(?P<tool>(?i:using|with|via)\s+[A-Za-z0-9+_./\- ]+?)\s*\.?$";

/// The four slots of a validated bullet. Present only on a successful match,
/// so every field is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmotParts {
    pub action: String,
    pub metric: String,
    pub outcome: String,
    pub tool: String,
}

/// Why a line failed the AMOT contract. Slots are checked in order, so the
/// variant names the first slot that could not be found after its predecessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum AmotError {
    #[error("bullet is empty")]
    Empty,
    #[error("bullet must be a single line")]
    MultiLine,
    #[error("missing action: line must start with a capitalised -ed/-ing verb")]
    MissingAction,
    #[error("missing metric: no number follows the action")]
    MissingMetric,
    #[error("missing outcome: no impact verb (reduced, increased, saved, ...) after the metric")]
    MissingOutcome,
    #[error("missing tool: line must end with 'using|with|via <tool>'")]
    MissingTool,
}

struct Patterns {
    action: Regex,
    through_metric: Regex,
    through_outcome: Regex,
    full: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: String| Regex::new(&p).expect("AMOT pattern is a valid regex");
        Patterns {
            action: compile(ACTION.to_string()),
            through_metric: compile(format!("{ACTION}.*?{METRIC}")),
            through_outcome: compile(format!("{ACTION}.*?{METRIC}.*?{OUTCOME}")),
            full: compile(format!("{ACTION}.*?{METRIC}.*?{OUTCOME}.*?{TOOL}")),
        }
    })
}

/// Validates `text` against the AMOT contract and extracts its slots.
///
/// Leading/trailing whitespace is ignored; captured slots are returned as
/// written (only surrounding whitespace is trimmed from outcome and tool).
pub fn parse_amot(text: &str) -> Result<AmotParts, AmotError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmotError::Empty);
    }
    if text.contains('\n') || text.contains('\r') {
        return Err(AmotError::MultiLine);
    }

    let p = patterns();
    let Some(caps) = p.full.captures(text) else {
        return Err(diagnose(p, text));
    };

    Ok(AmotParts {
        action: caps["action"].to_string(),
        metric: caps["metric"].to_string(),
        outcome: caps["outcome"].trim().to_string(),
        tool: caps["tool"].trim().to_string(),
    })
}

fn diagnose(p: &Patterns, text: &str) -> AmotError {
    if !p.action.is_match(text) {
        AmotError::MissingAction
    } else if !p.through_metric.is_match(text) {
        AmotError::MissingMetric
    } else if !p.through_outcome.is_match(text) {
        AmotError::MissingOutcome
    } else {
        AmotError::MissingTool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_bullet_matches() {
        let parts =
            parse_amot("Improved data pipeline by 35% which reduced latency using Python").unwrap();
        assert_eq!(parts.action, "Improved");
        assert_eq!(parts.metric, "35%");
        assert!(parts.outcome.starts_with("reduced"));
        assert_eq!(parts.outcome, "reduced latency");
        assert_eq!(parts.tool, "using Python");
    }

    #[test]
    fn test_missing_tool_rejected() {
        assert_eq!(
            parse_amot("Improved data pipeline by 35% which reduced latency"),
            Err(AmotError::MissingTool)
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let text = "Migrated 14 legacy services and accelerated release cadence via ArgoCD";
        let first = parse_amot(text);
        for _ in 0..5 {
            assert_eq!(parse_amot(text), first);
        }
        let bad = "Worked on things";
        assert_eq!(parse_amot(bad), parse_amot(bad));
    }

    #[test]
    fn test_comma_grouped_metric() {
        let parts = parse_amot(
            "Automated invoice reconciliation for 1,200 vendors and cut processing time using Airflow",
        )
        .unwrap();
        assert_eq!(parts.metric, "1,200");
        assert_eq!(parts.outcome, "cut processing time");
        assert_eq!(parts.tool, "using Airflow");
    }

    #[test]
    fn test_decimal_metric() {
        let parts =
            parse_amot("Tuning 2.5 TB warehouse queries boosted dashboard speed with dbt").unwrap();
        assert_eq!(parts.action, "Tuning");
        assert_eq!(parts.metric, "2.5");
        assert_eq!(parts.tool, "with dbt");
    }

    #[test]
    fn test_trailing_period_not_in_tool() {
        let parts = parse_amot(
            "Redesigned search indexing across 8 clusters and increased query throughput via Elasticsearch.",
        )
        .unwrap();
        assert_eq!(parts.tool, "via Elasticsearch");
    }

    #[test]
    fn test_tool_with_internal_dot() {
        let parts =
            parse_amot("Optimized 12 API routes which cut p95 response time using Node.js").unwrap();
        assert_eq!(parts.tool, "using Node.js");
    }

    #[test]
    fn test_lowercase_action_rejected() {
        assert_eq!(
            parse_amot("improved data pipeline by 35% which reduced latency using Python"),
            Err(AmotError::MissingAction)
        );
    }

    #[test]
    fn test_action_must_end_in_ed_or_ing() {
        assert_eq!(
            parse_amot("Built data pipeline by 35% which reduced latency using Python"),
            Err(AmotError::MissingAction)
        );
    }

    #[test]
    fn test_missing_metric() {
        assert_eq!(
            parse_amot("Improved data pipeline which reduced latency using Python"),
            Err(AmotError::MissingMetric)
        );
    }

    #[test]
    fn test_outcome_before_metric_is_out_of_order() {
        assert_eq!(
            parse_amot("Improved pipeline which reduced latency by 35% using Python"),
            Err(AmotError::MissingOutcome)
        );
    }

    #[test]
    fn test_tool_before_outcome_is_out_of_order() {
        assert_eq!(
            parse_amot("Improved pipeline by 35% using Python which reduced latency"),
            Err(AmotError::MissingTool)
        );
    }

    #[test]
    fn test_multiline_rejected() {
        assert_eq!(
            parse_amot("Improved data pipeline by 35%\nwhich reduced latency using Python"),
            Err(AmotError::MultiLine)
        );
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(parse_amot("   "), Err(AmotError::Empty));
    }

    #[test]
    fn test_outcome_verb_must_be_whole_word() {
        // "executed" contains "cut" but is not an outcome verb
        assert_eq!(
            parse_amot("Delivered 4 releases and executed migrations using Terraform"),
            Err(AmotError::MissingOutcome)
        );
    }
}
