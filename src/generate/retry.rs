//! Exponential backoff for the text generator.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, 1s initial wait, 30s cap.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
        }
    }
}

/// Run `attempt` until it succeeds or the policy is used up.
///
/// The final error is passed through `wrap_exhausted`. A policy with zero
/// attempts still makes one.
pub async fn retry_with_backoff<T, E, Fut, F, W>(
    policy: &RetryPolicy,
    mut attempt: F,
    wrap_exhausted: W,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_interval: policy.max_interval,
        max_elapsed_time: None,
        ..Default::default()
    };
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt_no = 1;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt_no >= max_attempts => {
                warn!("All {} attempts failed. Last error: {}", max_attempts, e);
                return Err(wrap_exhausted(e));
            }
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempt_no, max_attempts, e);
                if let Some(wait) = backoff.next_backoff() {
                    tokio::time::sleep(wait).await;
                }
                attempt_no += 1;
            }
        }
    }
}
