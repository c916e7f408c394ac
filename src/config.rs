//! Environment-driven settings.
//!
//! The binary loads `.env` before calling [`Settings::from_env`].

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::delivery::HttpMailer;
use crate::error::{ConfigError, DeliveryError};
use crate::generate::DEFAULT_TIMEOUT;
use crate::github::{GitHubToken, discover_token};
use crate::request::is_valid_email;

pub const API_URL_VAR: &str = "RELEASECAST_GITHUB_API_URL";
pub const MAIL_ENDPOINT_VAR: &str = "RELEASECAST_MAIL_ENDPOINT";
pub const MAIL_TOKEN_VAR: &str = "RELEASECAST_MAIL_TOKEN";
pub const FROM_EMAIL_VAR: &str = "RELEASECAST_FROM_EMAIL";
pub const FALLBACK_FROM_EMAIL_VAR: &str = "FROM_EMAIL";
pub const CLAUDE_TIMEOUT_VAR: &str = "RELEASECAST_CLAUDE_TIMEOUT";

/// Runtime settings for the default pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github_token: Option<GitHubToken>,
    pub github_api_url: Option<String>,
    pub mail_endpoint: Option<String>,
    pub mail_token: Option<String>,
    pub from_email: Option<String>,
    pub claude_timeout: Duration,
}

impl Settings {
    /// Read settings from the environment, asking the gh CLI for a token first.
    pub fn from_env() -> Self {
        Self::with_token(discover_token())
    }

    /// Read settings from the environment with an already resolved token.
    pub fn with_token(github_token: Option<GitHubToken>) -> Self {
        let claude_timeout = match non_empty_var(CLAUDE_TIMEOUT_VAR) {
            Some(raw) => parse_timeout(&raw).unwrap_or_else(|e| {
                warn!("{}, using default of {}s", e, DEFAULT_TIMEOUT.as_secs());
                DEFAULT_TIMEOUT
            }),
            None => DEFAULT_TIMEOUT,
        };

        Self {
            github_token,
            github_api_url: non_empty_var(API_URL_VAR),
            mail_endpoint: non_empty_var(MAIL_ENDPOINT_VAR),
            mail_token: non_empty_var(MAIL_TOKEN_VAR),
            from_email: non_empty_var(FROM_EMAIL_VAR)
                .or_else(|| non_empty_var(FALLBACK_FROM_EMAIL_VAR)),
            claude_timeout,
        }
    }

    /// Problems that would stop a real run. Empty when usable.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.mail_endpoint.is_none() {
            issues.push(format!("{} is not set", MAIL_ENDPOINT_VAR));
        }
        match &self.from_email {
            None => issues.push(format!(
                "{} (or {}) is not set",
                FROM_EMAIL_VAR, FALLBACK_FROM_EMAIL_VAR
            )),
            Some(from) if !is_valid_email(from) => {
                issues.push(format!("Sender address '{}' is not a valid email", from))
            }
            Some(_) => {}
        }
        if self.github_token.is_none() {
            issues.push(
                "No GitHub token found (gh auth login, GITHUB_TOKEN or GH_TOKEN); using anonymous access"
                    .to_string(),
            );
        }

        issues
    }

    /// Mailer for the configured HTTP mail API.
    pub fn http_mailer(&self) -> Result<HttpMailer, DeliveryError> {
        let endpoint = self
            .mail_endpoint
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured(format!("{} is not set", MAIL_ENDPOINT_VAR)))?;
        let from = self.from_email.as_deref().ok_or_else(|| {
            DeliveryError::NotConfigured(format!("{} is not set", FROM_EMAIL_VAR))
        })?;

        HttpMailer::new(endpoint, from, self.mail_token.clone())
    }
}

/// Parse a positive number of seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            key: CLAUDE_TIMEOUT_VAR,
            value: raw.to_string(),
        }),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
