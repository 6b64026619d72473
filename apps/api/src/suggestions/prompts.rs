// Prompt for the bullet candidate producer.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::suggestions::models::GenerationContext;

pub fn bullet_system_prompt() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} You are an expert resume writer who writes \
         single-sentence achievement bullets in AMOT form."
    )
}

/// Asks for `batch_size` bullets as `{"bullets": ["...", ...]}`.
pub fn bullet_generation_prompt(
    ctx: &GenerationContext,
    category: &str,
    batch_size: usize,
) -> String {
    let role_summary = ctx
        .role_summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("(none provided)");
    let keywords = if ctx.keywords.is_empty() {
        "(none provided)".to_string()
    } else {
        ctx.keywords.join(", ")
    };

    format!(
        r#"Write {batch_size} distinct resume bullets for the "{category}" section.

JOB DESCRIPTION:
{job_description}

CANDIDATE ROLE SUMMARY:
{role_summary}

KEYWORDS TO FAVOUR:
{keywords}

Every bullet MUST follow AMOT, in this order, on a single line:
- Action: start with a capitalised past-tense or -ing verb (e.g. "Improved", "Leading")
- Metric: a number, optionally with % (e.g. "35%", "1,200", "3.5")
- Outcome: a clause starting with reduced, increased, improved, decreased, accelerated, cut, boosted, saved, grew or drove
- Tool: end with "using X", "with X" or "via X"

Examples:
- "Improved data pipeline by 35% which reduced latency using Python"
- "Migrated 14 legacy services to Kubernetes and accelerated release cadence via ArgoCD"

Bullets must not repeat each other. No numbering, no trailing commentary.

{NO_FABRICATION_INSTRUCTION}

Respond with JSON only:
{{"bullets": ["<bullet 1>", "<bullet 2>"]}}"#,
        job_description = ctx.job_description.trim(),
    )
}
