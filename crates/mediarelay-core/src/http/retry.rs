//! Bounded fixed-delay retry for transient transport failures
//!
//! Only [`TransportOutcome::RetryableFailure`] is retried. Fatal outcomes are
//! returned immediately, and once `max_attempts` sends have been made the
//! last failure is surfaced to the caller.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use serde_json::Value;
use tracing::{error, warn};

use crate::http::client::TransportOutcome;
use crate::http::error::HttpError;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of sends, including the first one
    pub max_attempts: u32,
    /// Fixed pause between sends
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom attempt bound; at least one attempt is always made
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// A policy that sends once and never waits
    pub fn no_retry() -> Self {
        Self::new(1).with_delay(Duration::ZERO)
    }

    pub fn create_backoff(&self) -> Constant {
        Constant::new(self.delay)
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Tracks attempts for one logical send
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
    backoff: Constant,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempts: 0,
            backoff,
        }
    }

    /// Count a send that is about to happen
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Decide what follows a failed send
    pub fn should_retry(&mut self, error: &HttpError) -> RetryDecision {
        if !error.should_retry() || self.attempts >= self.policy.max_attempts {
            return RetryDecision::NoRetry;
        }
        let delay = self.backoff.next_backoff().unwrap_or(self.policy.delay);
        RetryDecision::Retry { delay }
    }

    /// Get the number of attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }
}

/// Drive `send_fn` until it succeeds, fails fatally, or the attempt bound is hit
pub async fn execute_with_retry<F, Fut>(mut send_fn: F, policy: RetryPolicy) -> Result<Value, HttpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TransportOutcome>,
{
    let mut handler = RetryHandler::new(policy);

    loop {
        let attempt = handler.begin_attempt();
        let failure = match send_fn().await {
            TransportOutcome::Success(body) => return Ok(body),
            TransportOutcome::FatalFailure(error) => {
                error!(attempt, error = %error, "Request failed with a non-retryable error");
                return Err(error);
            }
            TransportOutcome::RetryableFailure(error) => error,
        };

        match handler.should_retry(&failure) {
            RetryDecision::Retry { delay } => {
                warn!(
                    attempt,
                    max_attempts = handler.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::NoRetry => {
                error!(
                    attempts = handler.attempts(),
                    error = %failure,
                    "Request failed, attempts exhausted"
                );
                return Err(failure);
            }
        }
    }
}
