//! Subscription Oracle — read-only view of the billing integration's records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::SubscriptionStatus;

#[async_trait]
pub trait SubscriptionOracle: Send + Sync {
    /// Status of the account's subscription, or `None` if it has never subscribed.
    async fn status(&self, user_id: Uuid) -> Result<Option<SubscriptionStatus>>;
}

/// Reads the `subscriptions` table maintained by the billing webhook handler.
pub struct PgSubscriptionOracle {
    pool: PgPool,
}

impl PgSubscriptionOracle {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionOracle for PgSubscriptionOracle {
    async fn status(&self, user_id: Uuid) -> Result<Option<SubscriptionStatus>> {
        // An account can accumulate several rows (cancelled then resubscribed);
        // an active one always wins, otherwise the most recent.
        let status: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT status::text
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY (status::text = 'active') DESC, created DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read subscription status")?;

        Ok(status.flatten().as_deref().map(SubscriptionStatus::parse))
    }
}
