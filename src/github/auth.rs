//! GitHub token discovery.
//!
//! Lookup order:
//! 1. `gh auth token` (gh CLI)
//! 2. `GITHUB_TOKEN` environment variable
//! 3. `GH_TOKEN` environment variable

use std::env;
use std::fmt;
use std::process::Command;

use tracing::debug;

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    GhCli,
    Env(&'static str),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::GhCli => f.write_str("gh CLI"),
            TokenSource::Env(var) => write!(f, "${}", var),
        }
    }
}

/// A GitHub token and its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubToken {
    pub value: String,
    pub source: TokenSource,
}

// Keep the secret out of logs.
impl fmt::Debug for GitHubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubToken")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Find a GitHub token, or `None` for anonymous access.
pub fn discover_token() -> Option<GitHubToken> {
    if let Some(value) = token_from_gh_cli() {
        debug!("Using GitHub token from gh CLI");
        return Some(GitHubToken {
            value,
            source: TokenSource::GhCli,
        });
    }

    token_from_env()
}

/// Environment-only lookup (`GITHUB_TOKEN`, then `GH_TOKEN`).
pub fn token_from_env() -> Option<GitHubToken> {
    ["GITHUB_TOKEN", "GH_TOKEN"].into_iter().find_map(|var| {
        env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|value| GitHubToken {
                value,
                source: TokenSource::Env(var),
            })
    })
}

fn token_from_gh_cli() -> Option<String> {
    which::which("gh").ok()?;

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
