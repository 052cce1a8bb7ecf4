//! Axum route handler for cover letter generation.
//!
//! Flow: caller context → gate inputs → decide → resume lookup → generate →
//!       post-action → respond.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::CallerContext;
use crate::entitlement::gate::{decide, PostAction, TrialFlag, FREE_GENERATION_LIMIT};
use crate::entitlement::quota::read_counter;
use crate::errors::AppError;
use crate::generation::generator::{generate_cover_letter, CoverLetterInput};
use crate::models::user::Caller;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCoverLetterRequest {
    #[serde(flatten)]
    pub input: CoverLetterInput,
    /// Client-held trial flag: `true` while the anonymous free generation is unspent.
    pub is_free_generation: Option<bool>,
    pub user_resume: Option<String>,
    /// Sent by the web client; never trusted over the session.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCoverLetterResponse {
    pub cover_letter: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate
///
/// 200 with the letter, 401 when an anonymous trial is spent, 403 when the free
/// quota is exhausted, 500 for everything else. Denied requests mutate nothing.
pub async fn handle_generate(
    State(state): State<AppState>,
    CallerContext(caller): CallerContext,
    payload: Result<Json<GenerateCoverLetterRequest>, JsonRejection>,
) -> Result<Json<GenerateCoverLetterResponse>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::Generation(format!("Unreadable request body: {e}")))?;

    let cover_letter = run_generation(&state, caller.as_ref(), request)
        .await
        .map_err(AppError::into_generation_failure)?;

    Ok(Json(GenerateCoverLetterResponse { cover_letter }))
}

async fn run_generation(
    state: &AppState,
    caller: Option<&Caller>,
    request: GenerateCoverLetterRequest,
) -> Result<String, AppError> {
    if let (Some(caller), Some(claimed)) = (caller, request.user_id.as_deref()) {
        if Uuid::parse_str(claimed).ok() != Some(caller.id) {
            warn!(
                "Body userId {claimed:?} does not match session account {}; using session",
                caller.id
            );
        }
    }

    let trial = TrialFlag::from_client(request.is_free_generation);

    // The counter only matters for signed-in callers without an active subscription.
    let counter = match caller {
        Some(c) if !c.has_active_subscription() => {
            read_counter(state.quota.as_ref(), c.id, state.quota_read_policy).await?
        }
        _ => 0,
    };

    let decision = decide(caller, trial, counter);
    info!(
        caller = caller_kind(caller),
        counter,
        allowed = decision.is_allowed(),
        unlimited = decision.is_unlimited(),
        exhausted = decision.is_exhausted(),
        "Entitlement decision"
    );

    let Some(post_action) = decision.post_action() else {
        return Err(if decision.is_exhausted() {
            AppError::quota_exceeded()
        } else {
            AppError::SignInRequired
        });
    };

    let resume = resolve_resume(state, caller, request.user_resume).await;

    let letter = generate_cover_letter(state.model.as_ref(), &request.input, resume.as_deref())
        .await?;

    apply_post_action(state, post_action).await;

    Ok(letter)
}

/// A non-blank resume in the body wins; otherwise the signed-in caller's profile.
/// A failed profile read only loses personalization.
async fn resolve_resume(
    state: &AppState,
    caller: Option<&Caller>,
    from_body: Option<String>,
) -> Option<String> {
    if let Some(resume) = from_body.filter(|r| !r.trim().is_empty()) {
        return Some(resume);
    }

    let caller = caller?;
    match state.profiles.resume(caller.id).await {
        Ok(resume) => resume.filter(|r| !r.trim().is_empty()),
        Err(e) => {
            warn!("Profile resume unreadable for {}, generating without it: {e:#}", caller.id);
            None
        }
    }
}

/// Storage failures here are logged and swallowed: the user already has their letter.
async fn apply_post_action(state: &AppState, action: PostAction) {
    match action {
        // Capped at the limit: a concurrent request that already took the last free
        // generation leaves the counter at the limit instead of pushing it past.
        PostAction::IncrementCounter(user_id) => {
            match state.quota.increment(user_id, FREE_GENERATION_LIMIT).await {
                Ok(Some(count)) => debug!("Generation count for {user_id} is now {count}"),
                Ok(None) => {
                    warn!("Generation count for {user_id} already at limit; not incremented")
                }
                Err(e) => error!("Failed to record generation for {user_id}: {e:#}"),
            }
        }
        PostAction::ConsumeTrial => debug!("Anonymous trial consumed; client marks it used"),
        PostAction::None => {}
    }
}

fn caller_kind(caller: Option<&Caller>) -> &'static str {
    match caller {
        None => "anonymous",
        Some(c) if c.has_active_subscription() => "subscriber",
        Some(_) => "free",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
