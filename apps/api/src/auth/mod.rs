//! Caller identity.
//!
//! A session token is optional everywhere: anything that does not verify is an
//! anonymous caller, never an error. Authorization decisions live in `entitlement`.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Caller, Identity};
use crate::state::AppState;

/// Audience the identity provider stamps on signed-in session tokens.
const SESSION_AUDIENCE: &str = "authenticated";

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
}

/// Verifies HS256 session tokens from `Authorization: Bearer <token>`.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SESSION_AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn verify(&self, token: &str) -> Option<Identity> {
        let claims = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Session token rejected, treating caller as anonymous: {e}");
                return None;
            }
        };

        match Uuid::parse_str(&claims.sub) {
            Ok(id) => Some(Identity {
                id,
                email: claims.email,
            }),
            Err(_) => {
                debug!("Session token subject is not an account id: {}", claims.sub);
                None
            }
        }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = bearer_token(headers)?;
        self.verify(token)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The request's caller, resolved once: identity first, then subscription status.
/// `None` means anonymous.
#[derive(Debug, Clone)]
pub struct CallerContext(pub Option<Caller>);

impl CallerContext {
    /// The signed-in caller, or `Unauthorized` for account endpoints.
    pub fn require(self) -> Result<Caller, AppError> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(identity) = state.identity.resolve(&parts.headers) else {
            return Ok(CallerContext(None));
        };

        let subscription_status = match state.subscriptions.status(identity.id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "Subscription lookup failed for {}, treating as unsubscribed: {e:#}",
                    identity.id
                );
                None
            }
        };

        Ok(CallerContext(Some(Caller::from_identity(
            identity,
            subscription_status,
        ))))
    }
}
