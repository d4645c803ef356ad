//! Error types for the timed poller.
use std::fmt;
use std::time::Duration;

/// Runtime error of `check_until`/`check_while`.
///
/// `Incomplete` carries the last result the poller observed along with the
/// configured wall-clock budget, so callers can inspect how far the polled
/// condition got. `Operation` wraps a failure raised by the polled operation
/// itself; the poller never retries those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<T, E> {
    /// The predicate never settled before the wall-clock budget was spent.
    Incomplete {
        /// The result observed on the final cycle.
        last: T,
        /// The configured wall-clock budget.
        timeout: Duration,
    },
    /// The polled operation failed; polling stopped immediately.
    Operation(E),
}

impl<T, E: fmt::Display> fmt::Display for PollError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete { timeout, .. } => {
                write!(f, "condition incomplete at timeout (limit: {:?})", timeout)
            }
            Self::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<T, E> std::error::Error for PollError<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<T, E> PollError<T, E> {
    /// Check if polling stopped because the deadline was reached.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    /// Check if polling stopped because the operation itself failed.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Borrow the last observed result, if the deadline was reached.
    pub fn last_observed(&self) -> Option<&T> {
        match self {
            Self::Incomplete { last, .. } => Some(last),
            _ => None,
        }
    }

    /// The configured wall-clock budget, if the deadline was reached.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Incomplete { timeout, .. } => Some(*timeout),
            _ => None,
        }
    }

    /// Extract the operation failure, if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}
