// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strip positional data from records that stopped sharing long ago.

use super::SweepJob;
use crate::models::{LocationDoc, LocationQuery, LocationUpdate};
use crate::time_utils::cutoff;
use chrono::{DateTime, Duration, Utc};

pub const NAME: &str = "retention-prune";

/// Default age, in days, after which a non-sharing record loses its position.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Deletes `lat`, `lng`, `accuracy`, `speed` and `heading` and sets
/// `stale = true` on records not sharing and not updated within `retention`.
///
/// The document itself is kept as a tombstone.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPruner {
    retention: Duration,
}

impl Default for RetentionPruner {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_RETENTION_DAYS))
    }
}

impl RetentionPruner {
    pub fn new(retention: Duration) -> Self {
        Self { retention }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl SweepJob for RetentionPruner {
    fn name(&self) -> &'static str {
        NAME
    }

    fn query(&self, now: DateTime<Utc>) -> LocationQuery {
        LocationQuery {
            is_sharing: false,
            updated_before: cutoff(now, self.retention),
        }
    }

    fn update_for(&self, doc: &LocationDoc) -> Option<LocationUpdate> {
        // Tombstones keep matching the query every day; skip the no-op rewrite.
        if doc.is_purged() {
            return None;
        }
        Some(LocationUpdate::PurgePosition)
    }
}
