//! Celestial event oracle: the rise/set lookup the daylight series is built from.
//!
//! The series builder only depends on the [`EventOracle`] trait. [`AstronomicalOracle`]
//! is the built-in implementation; [`RetryingOracle`] wraps any oracle whose failures
//! may be transient (for example one backed by a remote service).

use crate::config::RetryPolicy;
use crate::{Body, Direction, Error, Observer};
use chrono::{DateTime, Utc};
use core::fmt;
use log::warn;

pub mod moon;
pub mod search;
pub mod sun;

pub use search::AstronomicalOracle;

/// One rise/set lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSearch {
    /// Body whose horizon crossing is searched
    pub body: Body,
    /// Where the crossing is observed
    pub observer: Observer,
    /// Rising or setting
    pub direction: Direction,
    /// Start of the search window
    pub start: DateTime<Utc>,
    /// Length of the search window in days
    pub window_days: f64,
}

impl EventSearch {
    /// Search over `window_days` days from `start`.
    #[must_use]
    pub const fn new(
        body: Body,
        observer: Observer,
        direction: Direction,
        start: DateTime<Utc>,
        window_days: f64,
    ) -> Self {
        Self {
            body,
            observer,
            direction,
            start,
            window_days,
        }
    }
}

/// Whether an oracle failure may succeed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleErrorKind {
    /// Worth retrying (timeouts, dropped connections)
    Transient,
    /// Retrying cannot help
    Fatal,
}

/// Failure reported by an oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleError {
    kind: OracleErrorKind,
    message: String,
}

impl OracleError {
    /// A failure that may succeed on retry.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: OracleErrorKind::Transient,
            message: message.into(),
        }
    }

    /// A failure that retrying cannot fix.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: OracleErrorKind::Fatal,
            message: message.into(),
        }
    }

    /// Failure kind.
    #[must_use]
    pub const fn kind(&self) -> OracleErrorKind {
        self.kind
    }

    /// Whether a retry may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, OracleErrorKind::Transient)
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OracleErrorKind::Transient => write!(f, "transient oracle failure: {}", self.message),
            OracleErrorKind::Fatal => write!(f, "oracle failure: {}", self.message),
        }
    }
}

impl std::error::Error for OracleError {}

impl From<OracleError> for Error {
    fn from(err: OracleError) -> Self {
        Self::oracle_unavailable(err.to_string())
    }
}

/// Finds the instant a body crosses the observer's horizon.
///
/// `Ok(None)` means the crossing does not happen inside the window (circumpolar day
/// or night) and is a regular outcome, not a failure.
pub trait EventOracle {
    /// Looks up the first crossing in the requested direction.
    ///
    /// # Errors
    /// Returns an [`OracleError`] when the lookup itself fails.
    fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError>;
}

impl<O: EventOracle + ?Sized> EventOracle for &O {
    fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError> {
        (**self).find_event(search)
    }
}

impl<O: EventOracle + ?Sized> EventOracle for std::sync::Arc<O> {
    fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError> {
        (**self).find_event(search)
    }
}

/// Retries transient failures of the wrapped oracle with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryingOracle<O> {
    inner: O,
    policy: RetryPolicy,
}

impl<O: EventOracle> RetryingOracle<O> {
    /// Wraps `inner` with the given policy.
    #[must_use]
    pub const fn new(inner: O, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped oracle.
    #[must_use]
    pub const fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: EventOracle> EventOracle for RetryingOracle<O> {
    fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut retry = 0;
        loop {
            match self.inner.find_event(search) {
                Err(err) if err.is_transient() && retry + 1 < attempts => {
                    let delay = self.policy.backoff(retry);
                    warn!(
                        "{err}; retrying {:?} {:?} in {delay:?} (attempt {} of {attempts})",
                        search.body,
                        search.direction,
                        retry + 2
                    );
                    std::thread::sleep(delay);
                    retry += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct Flaky {
        failures_left: Cell<u32>,
        kind: OracleErrorKind,
        calls: Cell<u32>,
    }

    impl EventOracle for Flaky {
        fn find_event(&self, search: &EventSearch) -> Result<Option<DateTime<Utc>>, OracleError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(match self.kind {
                    OracleErrorKind::Transient => OracleError::transient("connection reset"),
                    OracleErrorKind::Fatal => OracleError::fatal("bad request"),
                });
            }
            Ok(Some(search.start))
        }
    }

    fn search() -> EventSearch {
        EventSearch::new(
            Body::Sun,
            Observer::new(0.0, 0.0, 0.0).unwrap(),
            Direction::Rising,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            1.0,
        )
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
            kind: OracleErrorKind::Transient,
            calls: Cell::new(0),
        };
        let oracle = RetryingOracle::new(&flaky, policy(3));
        assert_eq!(oracle.find_event(&search()), Ok(Some(search().start)));
        assert_eq!(flaky.calls.get(), 3);
    }

    #[test]
    fn test_retries_are_bounded() {
        let flaky = Flaky {
            failures_left: Cell::new(5),
            kind: OracleErrorKind::Transient,
            calls: Cell::new(0),
        };
        let oracle = RetryingOracle::new(&flaky, policy(2));
        assert!(oracle.find_event(&search()).is_err());
        assert_eq!(flaky.calls.get(), 2);
    }

    #[test]
    fn test_fatal_failures_are_not_retried() {
        let flaky = Flaky {
            failures_left: Cell::new(1),
            kind: OracleErrorKind::Fatal,
            calls: Cell::new(0),
        };
        let oracle = RetryingOracle::new(&flaky, policy(5));
        let err = oracle.find_event(&search()).unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(flaky.calls.get(), 1);

        let err: Error = err.into();
        assert!(matches!(err, Error::OracleUnavailable { .. }));
    }
}
