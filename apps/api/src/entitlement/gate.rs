//! Entitlement Gate — a stateless per-request decision.
//!
//! Inputs are read fresh from storage on every request; nothing is cached between
//! requests. Precedence: anonymous trial → active subscription → free quota.

use uuid::Uuid;

use crate::models::user::Caller;

/// Generations a signed-in account without an active subscription may run.
pub const FREE_GENERATION_LIMIT: u32 = 20;

/// The client-held anonymous trial flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialFlag {
    Unused,
    Used,
}

impl TrialFlag {
    /// `isFreeGeneration: true` means the client still holds its one free generation.
    /// Absent or `false` means it has been spent.
    pub fn from_client(is_free_generation: Option<bool>) -> Self {
        if is_free_generation == Some(true) {
            TrialFlag::Unused
        } else {
            TrialFlag::Used
        }
    }
}

/// What the caller must do once generation has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    /// Client marks its trial flag as used.
    ConsumeTrial,
    /// Server bumps the account's generation counter.
    IncrementCounter(Uuid),
    /// Subscribed account; nothing is metered.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    SignInRequired,
    QuotaExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(PostAction),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// True when the free quota is the reason for refusal.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Decision::Deny(DenyReason::QuotaExceeded))
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Decision::Allow(PostAction::None))
    }

    pub fn post_action(&self) -> Option<PostAction> {
        match self {
            Decision::Allow(action) => Some(*action),
            Decision::Deny(_) => None,
        }
    }
}

/// Decides whether a generation may proceed.
///
/// `counter` is only consulted for signed-in callers without an active subscription;
/// callers that never need it may pass 0.
pub fn decide(caller: Option<&Caller>, trial: TrialFlag, counter: u32) -> Decision {
    let Some(caller) = caller else {
        return match trial {
            TrialFlag::Unused => Decision::Allow(PostAction::ConsumeTrial),
            TrialFlag::Used => Decision::Deny(DenyReason::SignInRequired),
        };
    };

    if caller.has_active_subscription() {
        return Decision::Allow(PostAction::None);
    }

    if counter < FREE_GENERATION_LIMIT {
        Decision::Allow(PostAction::IncrementCounter(caller.id))
    } else {
        Decision::Deny(DenyReason::QuotaExceeded)
    }
}
