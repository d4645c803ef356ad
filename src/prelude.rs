//! Convenient re-exports for common Holdfast types.
pub use crate::{
    backoff::{Backoff, BackoffError, BackoffStrategy, MAX_BACKOFF},
    clock::{Clock, ManualClock, MonotonicClock},
    collection::{CommonAttributeList, NotEmptyList, ResponseList, SingleItemError},
    error::PollError,
    field::{FieldAccess, FieldError},
    jitter::Jitter,
    poll::{check_until, check_while, Poller},
    response::{ResponseInfo, ResponseInfoBuilder},
    retry::{BuildError, RetryPolicy, RetryPolicyBuilder},
    sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper},
};
