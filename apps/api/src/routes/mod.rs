pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers::handle_generate;
use crate::profile::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation
        .route("/generate", post(handle_generate))
        .route("/api/generate-cover-letter", post(handle_generate))
        // Account
        .route(
            "/api/v1/profile",
            get(handlers::handle_get_profile).put(handlers::handle_put_profile),
        )
        .route("/api/v1/usage", get(handlers::handle_get_usage))
        .with_state(state)
}
