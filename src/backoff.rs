//! Backoff strategies for retry policies.
//!
//! Provides constant and Fibonacci strategies, the latter with an optional
//! cap. Attempt semantics: attempt index `0` represents the initial call (no
//! delay), and retries start at `attempt = 1`. Delays saturate at a
//! documented maximum to avoid overflow.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use holdfast::Backoff;
//!
//! let backoff = Backoff::fibonacci(Duration::from_millis(100))
//!     .with_max(Duration::from_millis(250))
//!     .unwrap();
//! assert_eq!(backoff.delay(0), Duration::from_millis(0)); // initial call
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(3), Duration::from_millis(200));
//! assert_eq!(backoff.delay(6), Duration::from_millis(250)); // capped
//! ```
//!
//! Overflow behavior: computations that would overflow saturate to
//! `MAX_BACKOFF` (1 day). Fibonacci growth is computed with saturating
//! arithmetic, so arbitrarily large attempt indices are safe.

use std::fmt;
use std::time::Duration;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors returned by backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackoffError {
    /// `with_max` only applies to strategies that grow.
    #[error("with_max is only valid for fibonacci backoff")]
    ConstantDoesNotSupportMax,
    /// A zero cap would suppress every retry delay.
    #[error("max must be greater than zero")]
    MaxMustBePositive,
    /// The cap must leave room for at least the base delay.
    #[error("max ({max:?}) must be >= base ({base:?})")]
    MaxLessThanBase {
        /// Configured base delay.
        base: Duration,
        /// Rejected cap.
        max: Duration,
    },
}

/// Trait implemented by all backoff strategies.
pub trait BackoffStrategy: Send + Sync + fmt::Debug {
    /// Delay before the given attempt (0 = initial call, always zero).
    fn delay(&self, attempt: usize) -> Duration;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConstantBackoff {
    delay: Duration,
}

impl BackoffStrategy for ConstantBackoff {
    fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            Duration::from_millis(0)
        } else {
            self.delay
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FibonacciBackoff {
    base: Duration,
    max: Option<Duration>,
}

/// Saturating Fibonacci: `fib(0) = 0`, `fib(1) = 1`.
fn fibonacci(n: usize) -> u64 {
    let (mut prev, mut next) = (0u64, 1u64);
    for _ in 0..n {
        let sum = prev.saturating_add(next);
        prev = next;
        next = sum;
    }
    prev
}

impl BackoffStrategy for FibonacciBackoff {
    fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }
        let multiplier = u128::from(fibonacci(attempt));
        let base_nanos = self.base.as_nanos().saturating_mul(multiplier);
        let grown = Duration::from_nanos(base_nanos.min(MAX_BACKOFF.as_nanos()) as u64);
        let capped = self.max.map(|m| grown.min(m)).unwrap_or(grown);
        capped.min(MAX_BACKOFF)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BackoffKind {
    Constant(ConstantBackoff),
    Fibonacci(FibonacciBackoff),
}

impl BackoffStrategy for BackoffKind {
    fn delay(&self, attempt: usize) -> Duration {
        match self {
            BackoffKind::Constant(c) => c.delay(attempt),
            BackoffKind::Fibonacci(f) => f.delay(attempt),
        }
    }
}

/// Backoff strategy wrapper delegating to concrete strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    kind: BackoffKind,
}

impl Backoff {
    /// Create a constant backoff strategy
    pub fn constant(delay: Duration) -> Self {
        Self { kind: BackoffKind::Constant(ConstantBackoff { delay }) }
    }

    /// Create a Fibonacci backoff strategy: retry `n` waits `base * fib(n)`.
    pub fn fibonacci(base: Duration) -> Self {
        Self { kind: BackoffKind::Fibonacci(FibonacciBackoff { base, max: None }) }
    }

    /// Set a maximum delay for the backoff (fibonacci only).
    /// Returns an error if called on `Constant`, if `max` is zero, or if `max < base`.
    pub fn with_max(mut self, max: Duration) -> Result<Self, BackoffError> {
        if max.is_zero() {
            return Err(BackoffError::MaxMustBePositive);
        }
        match &mut self.kind {
            BackoffKind::Fibonacci(FibonacciBackoff { max: existing, base }) => {
                if max < *base {
                    return Err(BackoffError::MaxLessThanBase { base: *base, max });
                }
                *existing = Some(max);
                Ok(self)
            }
            BackoffKind::Constant(_) => Err(BackoffError::ConstantDoesNotSupportMax),
        }
    }

    /// Calculate the delay for a given attempt number (0-based; 0 = initial call, no delay).
    pub fn delay(&self, attempt: usize) -> Duration {
        self.kind.delay(attempt)
    }
}

impl BackoffStrategy for Backoff {
    fn delay(&self, attempt: usize) -> Duration {
        self.kind.delay(attempt)
    }
}
