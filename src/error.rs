//! Error types for releasecast modules using thiserror.

use thiserror::Error;

/// A repository identifier that cannot be reduced to a single `owner/name` pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Invalid repository format: '{0}'. Use 'owner/name', 'https://host/owner/name' or 'host:owner/name.git'"
)]
pub struct InvalidRepositoryFormat(pub String);

/// Errors from constructing a [`RevisionRequest`](crate::request::RevisionRequest).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    InvalidRepositoryFormat(#[from] InvalidRepositoryFormat),

    #[error("The {0} revision must not be empty")]
    EmptyRevision(&'static str),

    #[error("Invalid recipient email address: '{0}'")]
    InvalidEmail(String),
}

/// Errors from comparing two revisions on the hosting API.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error(transparent)]
    InvalidRepositoryFormat(#[from] InvalidRepositoryFormat),

    #[error("Repository not found: {owner}/{name}")]
    RepositoryNotFound { owner: String, name: String },

    #[error("Revision not found in {repository}: {detail}")]
    RevisionNotFound { repository: String, detail: String },

    #[error("GitHub API unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Errors from the text-generation stage.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Claude reported an error: {0}")]
    ExecutionFailed(String),

    #[error("Generated release log is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Failed to serialize prompt data: {0}")]
    SerializationFailed(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GenerationError>),
}

/// Errors from the delivery stage.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid recipient email address: '{0}'")]
    InvalidRecipient(String),

    #[error("Mail delivery is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to reach mail API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Email to {0} was not delivered")]
    NotDelivered(String),
}

/// Errors from loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Failure of a single pipeline stage.
///
/// Wrapped errors are transparent so the orchestrator can report the
/// underlying message unchanged.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Stage '{stage}' could not decode its input: {reason}")]
    InvalidInput { stage: String, reason: String },

    #[error("Stage '{stage}' requires output of '{key}', which is not available")]
    MissingContext { stage: String, key: String },

    #[error("Failed to serialize output of stage '{stage}': {reason}")]
    Serialization { stage: String, reason: String },

    #[error("{0}")]
    Failed(String),
}
