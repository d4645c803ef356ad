#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Holdfast ⚓
//!
//! Resilience and aggregation primitives for async Rust: bounded retry,
//! condition polling, and lazy result collections.
//!
//! ## Features
//!
//! - **Retry policies** with a required retryable-failure predicate, bounded
//!   attempt budgets, and constant or Fibonacci backoff randomized by jitter
//! - **Condition polling** (`check_until` / `check_while`) against a
//!   wall-clock deadline with a fixed inter-cycle delay
//! - **Lazy result cells** (`ResponseInfo`) resolved by a consume-once
//!   callback and viewed through an optional extractor
//! - **Broadcast collections** (`CommonAttributeList`, `ResponseList`) that
//!   read/write a named field across every element in one operation
//! - **Injectable time and randomness** so tests never wait on real time
//!
//! ## Quick Start
//!
//! ```rust
//! use holdfast::RetryPolicy;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct FlakyError;
//! impl std::fmt::Display for FlakyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "flaky") }
//! }
//! impl std::error::Error for FlakyError {}
//!
//! #[tokio::main]
//! async fn main() {
//!     // Up to 3 retries, sleeping a random duration in [0, 200ms] between attempts.
//!     let policy = RetryPolicy::new(3, |_: &FlakyError| true, Duration::from_millis(200))
//!         .expect("valid policy");
//!
//!     let result = policy.execute(|| async {
//!         // Your async operation here
//!         Ok::<_, FlakyError>(42)
//!     }).await;
//!     assert_eq!(result.unwrap(), 42);
//! }
//! ```

pub mod backoff;
pub mod clock;
pub mod collection;
pub mod error;
pub mod field;
pub mod jitter;
pub mod poll;
pub mod prelude;
pub mod response;
pub mod retry;
pub mod sleeper;

// Re-exports
pub use backoff::Backoff;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use collection::{CommonAttributeList, NotEmptyList, ResponseList, SingleItemError};
pub use error::PollError;
pub use field::{FieldAccess, FieldError};
pub use jitter::Jitter;
pub use poll::{check_until, check_while, Poller};
pub use response::{ResponseInfo, ResponseInfoBuilder};
pub use retry::{BuildError, RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
