//! Axum route handlers for the signed-in account's profile and usage.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::CallerContext;
use crate::entitlement::gate::FREE_GENERATION_LIMIT;
use crate::errors::AppError;
use crate::models::user::SubscriptionStatus;
use crate::state::AppState;

/// Upper bound on stored resume text, in characters.
pub const MAX_RESUME_CHARS: usize = 50_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileBody {
    pub resume: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub email: Option<String>,
    pub generations_used: u32,
    pub generation_limit: u32,
    /// `None` when the account has an active subscription.
    pub remaining: Option<u32>,
    pub unlimited: bool,
    pub subscription_status: Option<SubscriptionStatus>,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<Json<ProfileBody>, AppError> {
    let caller = caller.require()?;
    let resume = state.profiles.resume(caller.id).await?;
    Ok(Json(ProfileBody { resume }))
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<ProfileBody>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let caller = caller.require()?;
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let resume = body.resume.unwrap_or_default();

    if resume.chars().count() > MAX_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "resume cannot exceed {MAX_RESUME_CHARS} characters"
        )));
    }

    state.profiles.save_resume(caller.id, &resume).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/usage
///
/// Reports the caller's metered usage. Read failures surface here, unlike the
/// generation path, since nothing is being granted.
pub async fn handle_get_usage(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<Json<UsageResponse>, AppError> {
    let caller = caller.require()?;
    let used = state.quota.current(caller.id).await?.unwrap_or(0);
    let unlimited = caller.has_active_subscription();

    Ok(Json(UsageResponse {
        email: caller.email,
        generations_used: used,
        generation_limit: FREE_GENERATION_LIMIT,
        remaining: (!unlimited).then(|| FREE_GENERATION_LIMIT.saturating_sub(used)),
        unlimited,
        subscription_status: caller.subscription_status,
    }))
}
