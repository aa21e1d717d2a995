// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time sources.
//!
//! Jobs never call `Utc::now()` directly so tests can pin the invocation
//! time with [`MockClock`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Something that can tell the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that stays put until told to move.
#[derive(Debug)]
pub struct MockClock {
    timestamp_millis: AtomicI64,
}

impl Default for MockClock {
    fn default() -> Self {
        // 2026-01-16T14:40:00Z
        Self::at(Utc.timestamp_opt(1_768_574_400, 0).single().unwrap_or_default())
    }
}

impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            timestamp_millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Move the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        self.timestamp_millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.timestamp_millis
            .store(now.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.timestamp_millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_is_fixed_until_advanced() {
        let clock = MockClock::default();
        let first = clock.now();
        assert_eq!(first, clock.now());

        clock.advance(Duration::minutes(20));
        assert_eq!(clock.now() - first, Duration::minutes(20));
    }

    #[test]
    fn test_mock_clock_set() {
        let clock = MockClock::default();
        let target = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = Arc::new(MockClock::default());
        let shared: Arc<dyn Clock> = clock.clone();
        clock.advance(Duration::seconds(1));
        assert_eq!(shared.now(), clock.now());
    }
}
