//! Text generation through the Claude Code CLI.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::GenerationError;

use super::TextGenerator;
use super::retry::{RetryPolicy, retry_with_backoff};

/// Default timeout for one Claude invocation (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs a single Claude prompt.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude with the given prompt and return stdout.
    async fn run(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Executor that spawns the real `claude` binary.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    timeout: Duration,
}

impl CliExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CliExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl ClaudeExecutor for CliExecutor {
    async fn run(&self, prompt: &str) -> Result<String, GenerationError> {
        if which::which("claude").is_err() {
            return Err(GenerationError::NotInstalled);
        }

        debug!("Running claude with a {}-byte prompt", prompt.len());

        let output = timeout(
            self.timeout,
            Command::new("claude")
                .arg("-p")
                .arg(prompt)
                .arg("--output-format")
                .arg("json")
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))?
        .map_err(GenerationError::SpawnFailed)?;

        if !output.status.success() {
            return Err(GenerationError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Envelope printed by `claude --output-format json`.
#[derive(serde::Deserialize)]
struct CliEnvelope {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope, falling back to the raw text.
fn unwrap_envelope(stdout: &str) -> Result<String, GenerationError> {
    match serde_json::from_str::<CliEnvelope>(stdout) {
        Ok(envelope) if envelope.is_error => Err(GenerationError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(stdout.to_string()),
    }
}

/// [`TextGenerator`] backed by Claude, with retries.
pub struct ClaudeGenerator<E = CliExecutor> {
    executor: E,
    policy: RetryPolicy,
}

impl ClaudeGenerator<CliExecutor> {
    pub fn cli(timeout: Duration) -> Self {
        Self::with_executor(CliExecutor::new(timeout))
    }
}

impl<E: ClaudeExecutor> ClaudeGenerator<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl<E: ClaudeExecutor> TextGenerator for ClaudeGenerator<E> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        retry_with_backoff(
            &self.policy,
            move || async move { unwrap_envelope(&self.executor.run(prompt).await?) },
            |e| GenerationError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}
