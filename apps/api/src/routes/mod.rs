pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::suggestions::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Suggestion pipeline
        .route(
            "/api/v1/jobs/:job_id/categories/:category/next",
            post(handlers::handle_next),
        )
        .route(
            "/api/v1/jobs/:job_id/categories/:category/accept",
            post(handlers::handle_accept),
        )
        .route(
            "/api/v1/jobs/:job_id/categories/:category/reject",
            post(handlers::handle_reject),
        )
        .route(
            "/api/v1/jobs/:job_id/categories/:category/history",
            get(handlers::handle_history),
        )
        .route("/api/v1/jobs/:job_id/progress", get(handlers::handle_progress))
        .route("/api/v1/jobs/:job_id/accepted", get(handlers::handle_accepted))
        .route(
            "/api/v1/jobs/:job_id/quotas",
            post(handlers::handle_configure_quotas),
        )
        // Format contracts
        .route("/api/v1/validate/amot", post(handlers::handle_validate_amot))
        .route(
            "/api/v1/validate/skills",
            post(handlers::handle_validate_skills),
        )
        .with_state(state)
}
