mod auth;
mod config;
mod db;
mod entitlement;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::JwtIdentityResolver;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::entitlement::quota::PgQuotaStore;
use crate::entitlement::subscription::PgSubscriptionOracle;
use crate::llm_client::LlmClient;
use crate::profile::store::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cover letter API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    info!("Quota read failure policy: {:?}", config.quota_read_policy);

    // Build app state
    let state = AppState {
        identity: Arc::new(JwtIdentityResolver::new(&config.jwt_secret)),
        subscriptions: Arc::new(PgSubscriptionOracle::new(db.clone())),
        quota: Arc::new(PgQuotaStore::new(db.clone())),
        profiles: Arc::new(PgProfileStore::new(db)),
        model: Arc::new(llm),
        quota_read_policy: config.quota_read_policy,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
