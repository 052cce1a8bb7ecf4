use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who the session token says the caller is. Nothing here is read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Per-request caller record, built once by the `CallerContext` extractor and
/// threaded explicitly through the handlers that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub email: Option<String>,
    /// `None` when the account has never subscribed or the lookup failed.
    pub subscription_status: Option<SubscriptionStatus>,
}

impl Caller {
    pub fn from_identity(
        identity: Identity,
        subscription_status: Option<SubscriptionStatus>,
    ) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            subscription_status,
        }
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status
            .as_ref()
            .is_some_and(SubscriptionStatus::is_active)
    }
}

/// Subscription status as recorded by the billing integration.
/// Only `Active` unlocks unlimited generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    Canceled,
    Incomplete,
    IncompleteExpired,
    PastDue,
    Unpaid,
    Paused,
    #[serde(untagged)]
    Other(String),
}

impl SubscriptionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "canceled" => Self::Canceled,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "past_due" => Self::PastDue,
            "unpaid" => Self::Unpaid,
            "paused" => Self::Paused,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}
