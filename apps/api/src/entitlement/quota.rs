//! Quota Store — per-account generation counter.
//!
//! Only signed-in callers without an active subscription are metered. Rows are
//! created lazily by the first increment and never deleted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::QuotaReadPolicy;
use crate::errors::AppError;
use crate::models::usage::GenerationCountRow;

#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current count, or `None` when the account has never generated.
    async fn current(&self, user_id: Uuid) -> Result<Option<u32>>;

    /// Adds one generation and returns the new count, or `None` when the count is
    /// already at `limit` and was left unchanged.
    async fn increment(&self, user_id: Uuid, limit: u32) -> Result<Option<u32>>;
}

pub struct PgQuotaStore {
    pool: PgPool,
}

impl PgQuotaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn current(&self, user_id: Uuid) -> Result<Option<u32>> {
        let row: Option<GenerationCountRow> =
            sqlx::query_as("SELECT * FROM generation_counts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read generation count")?;

        Ok(row.map(|r| u32::try_from(r.count).unwrap_or(0)))
    }

    async fn increment(&self, user_id: Uuid, limit: u32) -> Result<Option<u32>> {
        // Single conditional statement: concurrent generations for one account can
        // neither lose an update nor push the count past the limit.
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let count: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO generation_counts (user_id, count, updated_at)
            VALUES ($1, 1, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET count = generation_counts.count + 1, updated_at = NOW()
            WHERE generation_counts.count < $2
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to increment generation count")?;

        Ok(count.map(|c| u32::try_from(c).unwrap_or(0)))
    }
}

/// Reads the counter for the gate, applying the configured read-failure policy.
///
/// A missing row is always 0. A read error is 0 under `FailOpen` and an internal
/// error under `FailClosed`.
pub async fn read_counter(
    store: &dyn QuotaStore,
    user_id: Uuid,
    policy: QuotaReadPolicy,
) -> Result<u32, AppError> {
    match store.current(user_id).await {
        Ok(count) => Ok(count.unwrap_or(0)),
        Err(e) => match policy {
            QuotaReadPolicy::FailOpen => {
                warn!("Generation count unreadable for {user_id}, treating as 0: {e:#}");
                Ok(0)
            }
            QuotaReadPolicy::FailClosed => Err(AppError::Internal(
                e.context(format!("generation count unreadable for {user_id}")),
            )),
        },
    }
}
