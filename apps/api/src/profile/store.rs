use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::usage::ProfileRow;

/// Free-text resume per account. The `profiles` table belongs to the auth provider's
/// schema; this service only reads the resume and upserts it from the profile page.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn resume(&self, user_id: Uuid) -> Result<Option<String>>;
    async fn save_resume(&self, user_id: Uuid, resume: &str) -> Result<()>;
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn resume(&self, user_id: Uuid) -> Result<Option<String>> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT id, resume, updated_at FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read profile")?;

        Ok(row.and_then(|r| r.resume))
    }

    async fn save_resume(&self, user_id: Uuid, resume: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, resume, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id)
            DO UPDATE SET resume = EXCLUDED.resume, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(resume)
        .execute(&self.pool)
        .await
        .context("Failed to save profile")?;

        Ok(())
    }
}
