mod config;
mod errors;
mod format;
mod llm_client;
mod ranking;
mod routes;
mod state;
mod store;
mod suggestions;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{HistoryStore, QuotaTracker};
use crate::suggestions::producer::LlmCandidateProducer;
use crate::suggestions::scorer::{CohereRelevanceScorer, LexicalRelevanceScorer, RelevanceScorer};
use crate::suggestions::SuggestionPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("quill_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quill API v{}", env!("CARGO_PKG_VERSION"));

    // Candidate producer
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
    )?;
    let producer = Arc::new(LlmCandidateProducer::new(llm));
    info!("Candidate producer initialized (model: {})", llm_client::MODEL);

    // Relevance scorer: rerank API when keyed, lexical otherwise
    let scorer: Arc<dyn RelevanceScorer> = match &config.cohere_api_key {
        Some(key) => {
            info!(
                "Relevance scorer: rerank ({})",
                suggestions::scorer::RERANK_MODEL
            );
            Arc::new(CohereRelevanceScorer::new(key.clone())?)
        }
        None => {
            info!("Relevance scorer: lexical (COHERE_API_KEY not set)");
            Arc::new(LexicalRelevanceScorer)
        }
    };

    let settings = config.pipeline.clone();
    info!(
        "Pipeline: batch_size={} max_attempts={} retries={} timeout={}s lambda={}",
        settings.batch_size,
        settings.max_attempts,
        settings.retry.max_attempts,
        settings.retry.timeout.as_secs(),
        settings.mmr_lambda
    );

    let pipeline = SuggestionPipeline::new(
        producer,
        scorer,
        Arc::new(HistoryStore::new()),
        Arc::new(QuotaTracker::new()),
        settings,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
