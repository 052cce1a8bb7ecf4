//! In-memory stand-ins for the external collaborators, plus a router harness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{bearer_token, IdentityResolver};
use crate::config::QuotaReadPolicy;
use crate::entitlement::quota::QuotaStore;
use crate::entitlement::subscription::SubscriptionOracle;
use crate::llm_client::{LlmError, TextCompletion};
use crate::models::user::{Identity, SubscriptionStatus};
use crate::profile::store::ProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Default)]
pub struct InMemoryQuotaStore {
    counts: Mutex<HashMap<Uuid, u32>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl InMemoryQuotaStore {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn set(&self, user_id: Uuid, count: u32) {
        self.counts.lock().unwrap().insert(user_id, count);
    }

    pub fn get(&self, user_id: Uuid) -> Option<u32> {
        self.counts.lock().unwrap().get(&user_id).copied()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn current(&self, user_id: Uuid) -> Result<Option<u32>> {
        if self.fail_reads {
            return Err(anyhow!("quota store unavailable"));
        }
        Ok(self.get(user_id))
    }

    async fn increment(&self, user_id: Uuid, limit: u32) -> Result<Option<u32>> {
        if self.fail_writes {
            return Err(anyhow!("quota store unavailable"));
        }
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(user_id).or_insert(0);
        if *count >= limit {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }
}

#[derive(Default)]
pub struct StaticSubscriptions {
    statuses: Mutex<HashMap<Uuid, SubscriptionStatus>>,
    fail: bool,
}

impl StaticSubscriptions {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn set(&self, user_id: Uuid, status: SubscriptionStatus) {
        self.statuses.lock().unwrap().insert(user_id, status);
    }
}

#[async_trait]
impl SubscriptionOracle for StaticSubscriptions {
    async fn status(&self, user_id: Uuid) -> Result<Option<SubscriptionStatus>> {
        if self.fail {
            return Err(anyhow!("billing records unavailable"));
        }
        Ok(self.statuses.lock().unwrap().get(&user_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryProfiles {
    resumes: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryProfiles {
    pub fn get(&self, user_id: Uuid) -> Option<String> {
        self.resumes.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfiles {
    async fn resume(&self, user_id: Uuid) -> Result<Option<String>> {
        Ok(self.get(user_id))
    }

    async fn save_resume(&self, user_id: Uuid, resume: &str) -> Result<()> {
        self.resumes
            .lock()
            .unwrap()
            .insert(user_id, resume.to_string());
        Ok(())
    }
}

/// Returns a canned letter (or fails) and records every prompt it receives.
pub struct FakeModel {
    reply: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for FakeModel {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 529,
            message: "Overloaded".to_string(),
        })
    }
}

/// Maps opaque bearer tokens straight to identities.
#[derive(Default)]
pub struct TokenTable {
    tokens: Mutex<HashMap<String, Identity>>,
}

impl IdentityResolver for TokenTable {
    fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = bearer_token(headers)?;
        self.tokens.lock().unwrap().get(token).cloned()
    }
}

pub const LETTER: &str = "Dear Hiring Manager,\n\nI would love to join your team.\n\nBest regards";

/// A router wired to in-memory collaborators, with handles kept for assertions.
pub struct TestApp {
    pub quota: Arc<InMemoryQuotaStore>,
    pub subscriptions: Arc<StaticSubscriptions>,
    pub profiles: Arc<InMemoryProfiles>,
    pub model: Arc<FakeModel>,
    pub identities: Arc<TokenTable>,
    pub quota_read_policy: QuotaReadPolicy,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            quota: Arc::new(InMemoryQuotaStore::default()),
            subscriptions: Arc::new(StaticSubscriptions::default()),
            profiles: Arc::new(InMemoryProfiles::default()),
            model: Arc::new(FakeModel::replying(LETTER)),
            identities: Arc::new(TokenTable::default()),
            quota_read_policy: QuotaReadPolicy::FailOpen,
        }
    }
}

impl TestApp {
    /// Registers a signed-in account and returns its id and bearer token.
    pub fn sign_in(&self) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let token = format!("session-{id}");
        self.identities.tokens.lock().unwrap().insert(
            token.clone(),
            Identity {
                id,
                email: Some(format!("{id}@example.com")),
            },
        );
        (id, token)
    }

    pub fn state(&self) -> AppState {
        AppState {
            identity: self.identities.clone(),
            subscriptions: self.subscriptions.clone(),
            quota: self.quota.clone(),
            profiles: self.profiles.clone(),
            model: self.model.clone(),
            quota_read_policy: self.quota_read_policy,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_string(&v).unwrap())
            }
            None => Body::empty(),
        };

        let response = build_router(self.state())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
