use std::sync::Arc;

use crate::auth::IdentityResolver;
use crate::config::QuotaReadPolicy;
use crate::entitlement::quota::QuotaStore;
use crate::entitlement::subscription::SubscriptionOracle;
use crate::llm_client::TextCompletion;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator sits behind a trait object so handlers never
/// know whether they are talking to Postgres or an in-memory stand-in.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityResolver>,
    pub subscriptions: Arc<dyn SubscriptionOracle>,
    pub quota: Arc<dyn QuotaStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub model: Arc<dyn TextCompletion>,
    pub quota_read_policy: QuotaReadPolicy,
}
