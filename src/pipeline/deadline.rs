//! Run deadline
//!
//! The deadline is checked between records only. An operation already in
//! flight always finishes or fails on its own terms.

use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Point in time after which no further record is started
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    // None when the timeout is too large to represent
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after<C: Clock + ?Sized>(clock: &C, timeout: Duration) -> Self {
        Self {
            expires_at: clock.now().checked_add(timeout),
        }
    }

    pub fn is_expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        match self.expires_at {
            Some(at) => clock.now() >= at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedClock(Cell<Instant>);

    impl Clock for FixedClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let start = Instant::now();
        let clock = FixedClock(Cell::new(start));
        let deadline = Deadline::after(&clock, Duration::from_secs(5));
        assert!(!deadline.is_expired(&clock));

        clock.0.set(start + Duration::from_secs(5));
        assert!(deadline.is_expired(&clock));
    }

    #[test]
    fn test_zero_timeout_is_already_expired() {
        let deadline = Deadline::after(&SystemClock, Duration::ZERO);
        assert!(deadline.is_expired(&SystemClock));
    }

    #[test]
    fn test_unrepresentable_timeout_never_expires() {
        let deadline = Deadline::after(&SystemClock, Duration::MAX);
        assert!(!deadline.is_expired(&SystemClock));
    }
}
