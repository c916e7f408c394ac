//! Repository identifier normalization.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::InvalidRepositoryFormat;

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("segment pattern is valid"));

/// A repository reduced to its `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Normalize a repository identifier.
    ///
    /// Accepted forms:
    /// - `owner/name`
    /// - `https://host/owner/name` (trailing slash, `.git` and deeper paths allowed)
    /// - `host:owner/name.git` (SSH style, e.g. `git@github.com:owner/name.git`)
    pub fn parse(input: &str) -> Result<Self, InvalidRepositoryFormat> {
        let invalid = || InvalidRepositoryFormat(input.to_string());
        let trimmed = input.trim().trim_end_matches('/');

        let (path, bare) = if let Some((_, rest)) = trimmed.split_once("://") {
            let (_host, path) = rest.split_once('/').ok_or_else(invalid)?;
            (path, false)
        } else if let Some((host, path)) = trimmed.split_once(':') {
            if host.is_empty() || host.contains('/') {
                return Err(invalid());
            }
            (path, false)
        } else {
            (trimmed, true)
        };

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        // URL forms may point deeper into the repository (`/tree/main`), bare ones may not.
        if segments.len() < 2 || (bare && segments.len() != 2) {
            return Err(invalid());
        }

        let owner = segments[0];
        let name = segments[1].strip_suffix(".git").unwrap_or(segments[1]);

        if !SEGMENT.is_match(owner) || !SEGMENT.is_match(name) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
