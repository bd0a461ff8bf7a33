use anyhow::{Context, Result};
use tracing::warn;

/// Process configuration, environment-provided. Nothing in here is a
/// compile-time constant; the signing secret in particular is injected
/// at startup and handed explicitly to the code that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub cookie_domain: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("GCHAT_JWT_SECRET").unwrap_or_else(|_| {
            warn!("GCHAT_JWT_SECRET not set, using the development secret");
            "dev-secret-change-me".into()
        });

        Ok(Self {
            host: env_or("GCHAT_HOST", "0.0.0.0"),
            port: env_or("GCHAT_PORT", "3000")
                .parse()
                .context("GCHAT_PORT must be a port number")?,
            db_path: env_or("GCHAT_DB_PATH", "gchat.db"),
            jwt_secret,
            cookie_domain: env_or("GCHAT_COOKIE_DOMAIN", "localhost"),
            request_timeout_secs: env_or("GCHAT_REQUEST_TIMEOUT_SECS", "30")
                .parse()
                .context("GCHAT_REQUEST_TIMEOUT_SECS must be a number of seconds")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
