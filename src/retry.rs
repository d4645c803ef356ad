//! Retry policy for fallible async operations.
//!
//! Semantics:
//! - `max_retries` counts retries; a persistently failing operation is
//!   attempted `max_retries + 1` times in total.
//! - `retry_if` decides whether a failure is retryable. Non-retryable
//!   failures propagate immediately without retry; the policy never sleeps
//!   for them.
//! - On exhaustion the LAST failure propagates unchanged; callers match on
//!   their own error type, never on a wrapper.
//! - Backoff calculates the delay per retry attempt; jitter randomizes it.
//!   The default pairing (`Backoff::constant(max_sleep)` + `Jitter::Full`)
//!   sleeps a uniform random duration in `[0, max_sleep]`.
//! - Sleeper controls how delays are applied (production uses
//!   `TokioSleeper`; tests can inject `InstantSleeper`/`TrackingSleeper`).
//!
//! Invariants:
//! - Attempts never exceed `max_retries + 1`.
//! - The sleeper runs exactly once per retry, never after the final failure.
//! - Policy validation happens at build time, never at call time.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use holdfast::{Backoff, Jitter, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct MyErr;
//! impl std::fmt::Display for MyErr { fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "oops") } }
//! impl std::error::Error for MyErr {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<MyErr>::builder()
//!     .max_retries(3) // total attempts = 4
//!     .backoff(Backoff::fibonacci(Duration::from_millis(100)))
//!     .with_jitter(Jitter::full())
//!     .retry_if(|_e| true)
//!     .build()
//!     .unwrap();
//! let result: Result<(), MyErr> = policy.execute(|| async { Err(MyErr) }).await;
//! assert!(result.is_err());
//! # });
//! ```

use crate::{Backoff, Jitter, Sleeper, TokioSleeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retry policy combining backoff, jitter, predicate, and sleeper.
#[derive(Clone)]
pub struct RetryPolicy<E> {
    max_retries: usize,
    backoff: Backoff,
    jitter: Jitter,
    retry_if: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> std::fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("sleeper", &"<sleeper>")
            .field("retry_if", &"<predicate>")
            .finish()
    }
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// No retryable failure kinds were configured.
    #[error("no retryable failure kinds were configured")]
    NoRetryableFailures,
    /// `max_retries` must be >= 1.
    #[error("max_retries must be >= 1 (got {0})")]
    InvalidRetryCount(usize),
}

impl<E> RetryPolicy<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Shorthand for the common policy shape: up to `max_retries` retries of
    /// failures matching `retry_if`, sleeping a uniform random duration in
    /// `[0, max_sleep]` between attempts.
    pub fn new<F>(max_retries: usize, retry_if: F, max_sleep: Duration) -> Result<Self, BuildError>
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self::builder().max_retries(max_retries).retry_if(retry_if).max_sleep(max_sleep).build()
    }

    /// Execute an async operation with retry semantics.
    pub async fn execute<T, Fut, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        let total_attempts = self.max_retries + 1;

        for attempt in 0..total_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !(self.retry_if)(&e) {
                        return Err(e);
                    }

                    // If this was the last attempt, give the caller the
                    // failure itself.
                    if attempt + 1 >= total_attempts {
                        tracing::warn!(
                            attempts = total_attempts,
                            error = %e,
                            "retry budget exhausted"
                        );
                        return Err(e);
                    }

                    // Delay for this retry (1-indexed: first retry uses delay(1))
                    let delay = self.jitter.apply(self.backoff.delay(attempt + 1));
                    tracing::debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "operation failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }

        // Safety: unreachable because the loop runs total_attempts times and
        // the final iteration always returns.
        debug_assert!(false, "retry loop should have returned; this indicates a logic bug");
        unreachable!()
    }
}

/// Builder for `RetryPolicy`.
pub struct RetryPolicyBuilder<E> {
    max_retries: usize,
    backoff: Backoff,
    jitter: Jitter,
    retry_if: Option<Arc<dyn Fn(&E) -> bool + Send + Sync>>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Create a builder with sane defaults. A `retry_if` predicate is still
    /// required; `build` rejects a policy that would match no failures.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::constant(Duration::from_secs(1)),
            jitter: Jitter::Full,
            retry_if: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set the retry budget (total attempts = `max_retries + 1`). Must be >= 1.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sleep a uniform random duration in `[0, max_sleep]` between attempts.
    pub fn max_sleep(mut self, max_sleep: Duration) -> Self {
        self.backoff = Backoff::constant(max_sleep);
        self.jitter = Jitter::Full;
        self
    }

    /// Set backoff strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set jitter strategy.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Predicate selecting the retryable failure kinds. Required.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy<E>, BuildError> {
        if self.max_retries == 0 {
            return Err(BuildError::InvalidRetryCount(0));
        }
        let retry_if = self.retry_if.ok_or(BuildError::NoRetryableFailures)?;
        Ok(RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.backoff,
            jitter: self.jitter,
            retry_if,
            sleeper: self.sleeper,
        })
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
