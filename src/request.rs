//! The release request and its input checks.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::github::RepoSlug;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

/// One release run: which repository, which range, who to notify.
///
/// Deserialization goes through [`RevisionRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRevisionRequest")]
pub struct RevisionRequest {
    repository: String,
    from_revision: String,
    to_revision: String,
    notify_address: String,
}

impl RevisionRequest {
    /// Validate and normalize a request.
    ///
    /// The repository is stored as `owner/name`. Revisions are opaque and
    /// only checked for emptiness.
    pub fn new(
        repository: &str,
        from_revision: &str,
        to_revision: &str,
        notify_address: &str,
    ) -> Result<Self, RequestError> {
        let slug = RepoSlug::parse(repository)?;

        let from_revision = from_revision.trim();
        if from_revision.is_empty() {
            return Err(RequestError::EmptyRevision("from"));
        }
        let to_revision = to_revision.trim();
        if to_revision.is_empty() {
            return Err(RequestError::EmptyRevision("to"));
        }

        let notify_address = notify_address.trim();
        if !is_valid_email(notify_address) {
            return Err(RequestError::InvalidEmail(notify_address.to_string()));
        }

        Ok(Self {
            repository: slug.to_string(),
            from_revision: from_revision.to_string(),
            to_revision: to_revision.to_string(),
            notify_address: notify_address.to_string(),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn from_revision(&self) -> &str {
        &self.from_revision
    }

    pub fn to_revision(&self) -> &str {
        &self.to_revision
    }

    pub fn notify_address(&self) -> &str {
        &self.notify_address
    }
}

#[derive(Deserialize)]
struct RawRevisionRequest {
    repository: String,
    from_revision: String,
    to_revision: String,
    notify_address: String,
}

impl TryFrom<RawRevisionRequest> for RevisionRequest {
    type Error = RequestError;

    fn try_from(raw: RawRevisionRequest) -> Result<Self, Self::Error> {
        Self::new(
            &raw.repository,
            &raw.from_revision,
            &raw.to_revision,
            &raw.notify_address,
        )
    }
}

/// Basic shape check for an email address.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL.is_match(address)
}

/// Whether `s` looks like a full or abbreviated commit SHA (4-40 hex chars).
pub fn is_commit_sha(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// First `len` characters of a revision, for display.
pub fn shorten_sha(sha: &str, len: usize) -> String {
    sha.chars().take(len).collect()
}
