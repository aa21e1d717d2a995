// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turn off sharing sessions whose client went quiet.

use super::SweepJob;
use crate::models::{LocationDoc, LocationQuery, LocationUpdate};
use crate::time_utils::cutoff;
use chrono::{DateTime, Duration, Utc};

pub const NAME: &str = "sharing-timeout-sweep";

/// Default idle time, in minutes, after which a sharing session is switched off.
pub const DEFAULT_TIMEOUT_MINUTES: i64 = 15;

/// Sets `isSharing = false` and stamps `autoOffAt` on records still marked
/// as sharing but not updated within `timeout`.
#[derive(Debug, Clone, Copy)]
pub struct SharingTimeoutSweeper {
    timeout: Duration,
}

impl Default for SharingTimeoutSweeper {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TIMEOUT_MINUTES))
    }
}

impl SharingTimeoutSweeper {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SweepJob for SharingTimeoutSweeper {
    fn name(&self) -> &'static str {
        NAME
    }

    fn query(&self, now: DateTime<Utc>) -> LocationQuery {
        LocationQuery {
            is_sharing: true,
            updated_before: cutoff(now, self.timeout),
        }
    }

    fn update_for(&self, _doc: &LocationDoc) -> Option<LocationUpdate> {
        Some(LocationUpdate::DisableSharing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_query_targets_sharing_records_older_than_timeout() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let query = SharingTimeoutSweeper::default().query(now);

        assert!(query.is_sharing);
        assert_eq!(
            query.updated_before,
            Utc.with_ymd_and_hms(2026, 6, 1, 11, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_custom_timeout() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let sweeper = SharingTimeoutSweeper::new(Duration::minutes(5));
        assert_eq!(sweeper.timeout(), Duration::minutes(5));
        assert_eq!(
            sweeper.query(now).updated_before,
            Utc.with_ymd_and_hms(2026, 6, 1, 11, 55, 0).unwrap()
        );
    }

    #[test]
    fn test_undecodable_record_is_still_switched_off() {
        let path = crate::models::LocationPath::for_user("mallory", "current");
        let doc = LocationDoc::undecodable(path);
        assert_eq!(
            SharingTimeoutSweeper::default().update_for(&doc),
            Some(LocationUpdate::DisableSharing)
        );
    }
}
