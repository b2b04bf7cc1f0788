//! Class-aware retry logic for the remote review call.
//!
//! Failures are sorted into three classes:
//! - `Fatal` (bad credentials): returned at once, never retried;
//! - `RateLimited`: retried after `base * attempt * multiplier`;
//! - `Transient` (everything else): retried after `base * attempt`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use tracing::warn;

use crate::config::ResolvedConfig;
use crate::error::RemoteError;

/// How a failed attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Fatal,
    RateLimited,
    Transient,
}

/// Errors that know their retry class.
pub trait Classify {
    fn failure_class(&self) -> FailureClass;
}

impl Classify for RemoteError {
    fn failure_class(&self) -> FailureClass {
        match self {
            RemoteError::Unauthorized { .. } | RemoteError::ClientBuild(_) => FailureClass::Fatal,
            RemoteError::RateLimited { .. } => FailureClass::RateLimited,
            RemoteError::Http { .. }
            | RemoteError::Timeout(_)
            | RemoteError::Transport(_)
            | RemoteError::InvalidEnvelope(_)
            | RemoteError::EmptyCompletion => FailureClass::Transient,
        }
    }
}

/// Limits for one retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Extra factor applied to waits after a rate-limited failure.
    pub rate_limit_multiplier: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            rate_limit_multiplier: 2,
        }
    }

    pub fn with_rate_limit_multiplier(mut self, multiplier: u32) -> Self {
        self.rate_limit_multiplier = multiplier.max(1);
        self
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
        .with_rate_limit_multiplier(config.rate_limit_multiplier)
    }
}

/// Backoff that grows linearly: `base`, `2 * base`, `3 * base`, ...
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base: Duration,
    attempt: u32,
}

impl LinearBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base, attempt: 0 }
    }
}

impl Backoff for LinearBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt = self.attempt.checked_add(1)?;
        self.base.checked_mul(self.attempt)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// State of a failed attempt, handed to the observer.
#[derive(Debug)]
pub struct RetryAttempt<'a, E> {
    pub attempt_number: u32,
    pub last_error: &'a E,
    pub class: FailureClass,
    /// `None` when no further attempt will be made.
    pub next_delay: Option<Duration>,
}

/// Run `operation` until it succeeds, fails fatally, or attempts run out.
///
/// On exhaustion the last error is returned unchanged.
pub async fn call_with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    call_with_retry_observed(policy, operation, |_| {}).await
}

/// [`call_with_retry`] with a hook that sees every failed attempt.
pub async fn call_with_retry_observed<T, E, F, Fut, O>(
    policy: &RetryPolicy,
    mut operation: F,
    mut observe: O,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
    O: FnMut(&RetryAttempt<'_, E>),
{
    let mut backoff = LinearBackoff::new(policy.base_delay);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let class = error.failure_class();
        let next_delay = match class {
            FailureClass::Fatal => None,
            _ if attempts >= policy.max_attempts => None,
            FailureClass::RateLimited => backoff
                .next_backoff()
                .and_then(|d| d.checked_mul(policy.rate_limit_multiplier)),
            FailureClass::Transient => backoff.next_backoff(),
        };

        observe(&RetryAttempt {
            attempt_number: attempts,
            last_error: &error,
            class,
            next_delay,
        });

        match next_delay {
            Some(wait) => {
                warn!(
                    "Review attempt {}/{} failed ({:?}): {}. Retrying in {} ms",
                    attempts,
                    policy.max_attempts,
                    class,
                    error,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
            None => {
                if class != FailureClass::Fatal {
                    warn!("All {} review attempts failed. Last error: {}", attempts, error);
                }
                return Err(error);
            }
        }
    }
}
