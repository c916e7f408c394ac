//! Terminal result of a pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::RevisionRequest;

/// What one run produced. Built once, at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum PipelineOutcome {
    #[serde(rename = "success")]
    Success {
        repository: String,
        from_revision: String,
        to_revision: String,
        notify_address: String,
        result: Value,
    },
    #[serde(rename = "error")]
    Failure {
        repository: String,
        from_revision: String,
        to_revision: String,
        notify_address: String,
        error: String,
    },
}

impl PipelineOutcome {
    pub fn success(request: &RevisionRequest, result: Value) -> Self {
        PipelineOutcome::Success {
            repository: request.repository().to_string(),
            from_revision: request.from_revision().to_string(),
            to_revision: request.to_revision().to_string(),
            notify_address: request.notify_address().to_string(),
            result,
        }
    }

    pub fn failure(request: &RevisionRequest, error: impl Into<String>) -> Self {
        PipelineOutcome::Failure {
            repository: request.repository().to_string(),
            from_revision: request.from_revision().to_string(),
            to_revision: request.to_revision().to_string(),
            notify_address: request.notify_address().to_string(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success { .. })
    }

    pub fn repository(&self) -> &str {
        match self {
            PipelineOutcome::Success { repository, .. }
            | PipelineOutcome::Failure { repository, .. } => repository,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            PipelineOutcome::Success { result, .. } => Some(result),
            PipelineOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Success { .. } => None,
            PipelineOutcome::Failure { error, .. } => Some(error),
        }
    }

    /// Process exit code for CLI callers.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}
