use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::error::LoaderError;

pub const MAX_ATTEMPTS: u32 = 10;
pub const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Fixed-delay, bounded retry. No jitter and no growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: LoaderError,
    },
}

/// Runs `operation` until it succeeds or the policy's attempts are used up. Every
/// error kind is retried the same way. The closure receives the 1-based attempt.
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LoaderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, max_attempts, "attempt succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                warn!(attempt, max_attempts, error = %err, "attempt failed");
                if attempt >= max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
