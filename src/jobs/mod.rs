// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled maintenance jobs over location records.
//!
//! Every job has the same shape: one collection-group query, one grouped
//! write. [`plan`] is the read half and has no side effects; [`run_job`]
//! adds the write.
//!
//! - [`SharingTimeoutSweeper`]: turns off sharing that stopped updating.
//! - [`RetentionPruner`]: strips positions from long-idle records.

pub mod retention;
pub mod sharing_timeout;

pub use retention::RetentionPruner;
pub use sharing_timeout::SharingTimeoutSweeper;

use crate::clock::Clock;
use crate::db::LocationStore;
use crate::error::{AppError, Result};
use crate::models::{LocationDoc, LocationMutation, LocationQuery, LocationUpdate};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// A query-then-update sweep.
pub trait SweepJob: Send + Sync {
    /// Stable job name, used in logs and schedule configuration.
    fn name(&self) -> &'static str;

    /// Records this job should look at, as of `now`.
    fn query(&self, now: DateTime<Utc>) -> LocationQuery;

    /// The update for a matched record, or `None` to leave it alone.
    fn update_for(&self, doc: &LocationDoc) -> Option<LocationUpdate>;
}

/// Summary of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job: &'static str,
    pub started_at: DateTime<Utc>,
    /// Records returned by the query
    pub matched: usize,
    /// Writes the store accepted
    pub written: usize,
}

/// Compute the mutations `job` would issue at `now`.
pub async fn plan(
    job: &dyn SweepJob,
    store: &dyn LocationStore,
    now: DateTime<Utc>,
) -> Result<(usize, Vec<LocationMutation>)> {
    let docs = store.find(&job.query(now)).await?;
    let matched = docs.len();

    let mutations = docs
        .into_iter()
        .filter_map(|doc| {
            job.update_for(&doc)
                .map(|update| LocationMutation {
                    path: doc.path,
                    update,
                })
        })
        .collect();

    Ok((matched, mutations))
}

/// Run one invocation of `job`: plan at the clock's current time, then
/// submit every mutation as one grouped write.
///
/// Partial write failure is reported as [`AppError::BatchWrite`] after the
/// whole batch has been attempted. Nothing is retried here.
pub async fn run_job(
    job: &dyn SweepJob,
    store: &dyn LocationStore,
    clock: &dyn Clock,
) -> Result<JobReport> {
    let started_at = clock.now();
    let (matched, mutations) = plan(job, store, started_at).await?;

    if mutations.is_empty() {
        debug!(job = job.name(), matched, "no location records to update");
        return Ok(JobReport {
            job: job.name(),
            started_at,
            matched,
            written: 0,
        });
    }

    let outcome = store.apply(&mutations).await?;

    if outcome.failed > 0 {
        return Err(AppError::BatchWrite {
            failed: outcome.failed,
            total: mutations.len(),
        });
    }

    info!(
        job = job.name(),
        matched,
        written = outcome.written,
        "updated location records"
    );

    Ok(JobReport {
        job: job.name(),
        started_at,
        matched,
        written: outcome.written,
    })
}
