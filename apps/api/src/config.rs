use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client;
use crate::ranking::{keywords, mmr};
use crate::suggestions::upstream::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a number is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    /// When absent, relevance falls back to the local lexical scorer.
    pub cohere_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub pipeline: PipelineSettings,
}

/// Knobs for the suggestion pipeline. `Default` matches the env defaults.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub batch_size: usize,
    /// Generation rounds before a request is reported as exhausted.
    pub max_attempts: u32,
    pub retry: RetryPolicy,
    pub mmr_lambda: f64,
    pub mmr_top_k: usize,
    pub keyword_top_n: usize,
    pub default_quota: u32,
    pub category_quotas: HashMap<String, u32>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_attempts: 3,
            retry: RetryPolicy::default(),
            mmr_lambda: mmr::DEFAULT_LAMBDA,
            mmr_top_k: 10,
            keyword_top_n: keywords::DEFAULT_TOP_N,
            default_quota: 4,
            category_quotas: HashMap::new(),
        }
    }
}

impl PipelineSettings {
    /// Target applied to a category the first time it is requested.
    pub fn default_target(&self, category: &str) -> u32 {
        self.category_quotas
            .get(category)
            .copied()
            .unwrap_or(self.default_quota)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PipelineSettings::default();
        let pipeline = PipelineSettings {
            batch_size: parse_env("SUGGESTION_BATCH_SIZE", defaults.batch_size)?,
            max_attempts: parse_env("SUGGESTION_MAX_ATTEMPTS", defaults.max_attempts)?,
            retry: RetryPolicy {
                max_attempts: parse_env("UPSTREAM_MAX_RETRIES", defaults.retry.max_attempts)?,
                timeout: Duration::from_secs(parse_env(
                    "UPSTREAM_TIMEOUT_SECS",
                    defaults.retry.timeout.as_secs(),
                )?),
                backoff: Duration::from_millis(parse_env(
                    "UPSTREAM_BACKOFF_MS",
                    defaults.retry.backoff.as_millis() as u64,
                )?),
            },
            mmr_lambda: parse_env("MMR_LAMBDA", defaults.mmr_lambda)?,
            mmr_top_k: parse_env("MMR_TOP_K", defaults.mmr_top_k)?,
            keyword_top_n: parse_env("KEYWORD_TOP_N", defaults.keyword_top_n)?,
            default_quota: parse_env("DEFAULT_CATEGORY_QUOTA", defaults.default_quota)?,
            category_quotas: match std::env::var("CATEGORY_QUOTAS") {
                Ok(raw) => parse_category_quotas(&raw).context("CATEGORY_QUOTAS is invalid")?,
                Err(_) => HashMap::new(),
            },
        };

        if !(0.0..=1.0).contains(&pipeline.mmr_lambda) {
            bail!("MMR_LAMBDA must be between 0 and 1");
        }
        if pipeline.default_quota == 0 {
            bail!("DEFAULT_CATEGORY_QUOTA must be at least 1");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| llm_client::DEFAULT_API_URL.to_string()),
            cohere_api_key: std::env::var("COHERE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            pipeline,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Parses `cat=target,cat=target`. Blank entries are skipped.
fn parse_category_quotas(raw: &str) -> Result<HashMap<String, u32>> {
    let mut quotas = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (category, target) = entry
            .split_once('=')
            .with_context(|| format!("expected 'category=target', got '{entry}'"))?;
        let category = category.trim();
        if category.is_empty() {
            bail!("empty category name in '{entry}'");
        }
        let target: u32 = target
            .trim()
            .parse()
            .with_context(|| format!("target for '{category}' must be a number"))?;
        if target == 0 {
            bail!("target for '{category}' must be at least 1");
        }
        quotas.insert(category.to_string(), target);
    }
    Ok(quotas)
}
