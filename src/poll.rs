//! Timed condition polling.
//!
//! `check_until` repeatedly invokes an async operation and evaluates a
//! predicate over its result, returning the first result that satisfies the
//! predicate. `check_while` is the inverted twin: it loops while the
//! predicate holds and returns the first result for which it is false.
//!
//! Semantics:
//! - A first-call success invokes the operation exactly once; no sleep occurs.
//! - Between cycles the poller sleeps `cycle`; the deadline is evaluated
//!   after each sleep, so no new cycle starts once the elapsed wall-clock
//!   time exceeds `timeout`.
//! - `timeout` and `cycle` are independent: a `cycle` larger than `timeout`
//!   still allows exactly one attempt.
//! - An `Err` from the operation ends polling immediately
//!   (`PollError::Operation`); the poller never retries operation failures.
//!   Wrap the operation in a `RetryPolicy` first if retries are wanted.
//!
//! Example
//! ```rust
//! use holdfast::check_until;
//! use std::convert::Infallible;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let polls = AtomicUsize::new(0);
//! let result = check_until(
//!     || async { Ok::<_, Infallible>(polls.fetch_add(1, Ordering::SeqCst) + 1) },
//!     |count| *count >= 3,
//!     Duration::from_secs(2),
//!     Duration::from_millis(10),
//! )
//! .await;
//! assert_eq!(result.unwrap(), 3);
//! # });
//! ```

use crate::clock::{Clock, MonotonicClock};
use crate::error::PollError;
use crate::sleeper::{Sleeper, TokioSleeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Poller configuration: a wall-clock budget and a fixed inter-cycle delay.
#[derive(Debug, Clone)]
pub struct Poller {
    timeout: Duration,
    cycle: Duration,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl Poller {
    /// Create a poller with production time sources.
    pub fn new(timeout: Duration, cycle: Duration) -> Self {
        Self {
            timeout,
            cycle,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(MonotonicClock::default()),
        }
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide a custom clock implementation.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Inspect the configured wall-clock budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Inspect the configured inter-cycle delay.
    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Poll until `predicate` is true for the operation's result.
    pub async fn check_until<T, E, Fut, Op, P>(
        &self,
        mut operation: Op,
        predicate: P,
    ) -> Result<T, PollError<T, E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
        P: Fn(&T) -> bool,
    {
        let started = self.clock.now_millis();
        let budget = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let mut cycles: usize = 0;

        loop {
            let result = operation().await.map_err(PollError::Operation)?;
            if predicate(&result) {
                return Ok(result);
            }

            cycles += 1;
            tracing::debug!(cycles, "condition not met, waiting for next cycle");
            self.sleeper.sleep(self.cycle).await;

            let elapsed = self.clock.now_millis().saturating_sub(started);
            if elapsed > budget {
                tracing::warn!(
                    elapsed_ms = elapsed,
                    timeout_ms = budget,
                    cycles,
                    "condition incomplete at timeout"
                );
                return Err(PollError::Incomplete { last: result, timeout: self.timeout });
            }
        }
    }

    /// Poll while `predicate` is true; return the first result for which it
    /// is false.
    pub async fn check_while<T, E, Fut, Op, P>(
        &self,
        operation: Op,
        predicate: P,
    ) -> Result<T, PollError<T, E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
        P: Fn(&T) -> bool,
    {
        self.check_until(operation, move |result| !predicate(result)).await
    }
}

/// Poll `operation` with production time sources until `predicate` is true.
pub async fn check_until<T, E, Fut, Op, P>(
    operation: Op,
    predicate: P,
    timeout: Duration,
    cycle: Duration,
) -> Result<T, PollError<T, E>>
where
    T: Send,
    Fut: Future<Output = Result<T, E>> + Send,
    Op: FnMut() -> Fut + Send,
    P: Fn(&T) -> bool,
{
    Poller::new(timeout, cycle).check_until(operation, predicate).await
}

/// Poll `operation` with production time sources while `predicate` is true.
pub async fn check_while<T, E, Fut, Op, P>(
    operation: Op,
    predicate: P,
    timeout: Duration,
    cycle: Duration,
) -> Result<T, PollError<T, E>>
where
    T: Send,
    Fut: Future<Output = Result<T, E>> + Send,
    Op: FnMut() -> Fut + Send,
    P: Fn(&T) -> bool,
{
    Poller::new(timeout, cycle).check_while(operation, predicate).await
}
