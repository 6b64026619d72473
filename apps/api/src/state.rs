use std::sync::Arc;

use crate::config::Config;
use crate::suggestions::SuggestionPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the producer, scorer, history and quota stores.
    pub pipeline: Arc<SuggestionPipeline>,
}
