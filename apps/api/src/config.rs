use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    /// HS256 secret the identity provider signs session tokens with.
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub quota_read_policy: QuotaReadPolicy,
}

/// What the generation endpoint does when the usage counter cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotaReadPolicy {
    /// Treat an unreadable counter like a missing one (count = 0) and allow.
    #[default]
    FailOpen,
    /// Refuse to generate until the counter can be read.
    FailClosed,
}

impl FromStr for QuotaReadPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(QuotaReadPolicy::FailOpen),
            "closed" => Ok(QuotaReadPolicy::FailClosed),
            other => {
                bail!("unknown quota read failure policy '{other}' (expected 'open' or 'closed')")
            }
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let quota_read_policy = match std::env::var("QUOTA_READ_FAILURE_POLICY") {
            Ok(raw) => raw
                .parse()
                .context("QUOTA_READ_FAILURE_POLICY must be 'open' or 'closed'")?,
            Err(_) => QuotaReadPolicy::default(),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            jwt_secret: require_env("AUTH_JWT_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            quota_read_policy,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
