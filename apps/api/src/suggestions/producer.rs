//! Candidate producer: pluggable source of raw bullet text.
//!
//! Default: `LlmCandidateProducer` (Claude through `LlmClient`).
//! Output is untrusted; the pipeline validates and dedups every line.
//!
//! The pipeline holds an `Arc<dyn CandidateProducer>`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::llm_client::{LlmClient, MODEL};
use crate::suggestions::models::GenerationContext;
use crate::suggestions::prompts::{bullet_generation_prompt, bullet_system_prompt};
use crate::suggestions::upstream::UpstreamError;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CandidateProducer: Send + Sync {
    /// Identifier recorded on every offer, for transparency.
    fn id(&self) -> &str;

    async fn produce(
        &self,
        ctx: &GenerationContext,
        category: &str,
        batch_size: usize,
    ) -> Result<Vec<String>, UpstreamError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmCandidateProducer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BulletBatch {
    bullets: Vec<String>,
}

pub struct LlmCandidateProducer {
    llm: LlmClient,
    id: String,
}

impl LlmCandidateProducer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            id: format!("anthropic:{MODEL}"),
        }
    }
}

#[async_trait]
impl CandidateProducer for LlmCandidateProducer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn produce(
        &self,
        ctx: &GenerationContext,
        category: &str,
        batch_size: usize,
    ) -> Result<Vec<String>, UpstreamError> {
        let prompt = bullet_generation_prompt(ctx, category, batch_size);
        let batch: BulletBatch = self
            .llm
            .call_json(&prompt, &bullet_system_prompt())
            .await?;

        debug!(
            "Producer returned {} raw candidates for category '{category}'",
            batch.bullets.len()
        );
        Ok(batch.bullets)
    }
}
