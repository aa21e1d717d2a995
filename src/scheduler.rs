// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cron-driven trigger loop for the sweep jobs.
//!
//! Each job gets its own task. A task sleeps until the next fire time,
//! runs the job to completion, then computes the following fire time from
//! the current clock, so a job never overlaps itself and ticks that pass
//! during a long run are dropped rather than queued.

use crate::clock::Clock;
use crate::config::Config;
use crate::db::LocationStore;
use crate::jobs::{run_job, RetentionPruner, SharingTimeoutSweeper, SweepJob};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// When and where a job runs.
#[derive(Debug, Clone)]
pub struct JobTrigger {
    pub schedule: Schedule,
    pub time_zone: Tz,
    pub region: String,
}

impl JobTrigger {
    /// First fire time strictly after `after`, evaluated in the trigger's zone.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.time_zone))
            .next()
            .map(|next| next.with_timezone(&Utc))
    }
}

/// A job paired with its trigger.
#[derive(Clone)]
pub struct ScheduledJob {
    pub job: Arc<dyn SweepJob>,
    pub trigger: JobTrigger,
}

/// Both sweep jobs, configured from `config`.
pub fn registered_jobs(config: &Config) -> Vec<ScheduledJob> {
    let trigger = |schedule: &Schedule| JobTrigger {
        schedule: schedule.clone(),
        time_zone: config.time_zone,
        region: config.gcp_region.clone(),
    };

    vec![
        ScheduledJob {
            job: Arc::new(SharingTimeoutSweeper::new(config.sharing_timeout)),
            trigger: trigger(&config.sharing_sweep_schedule),
        },
        ScheduledJob {
            job: Arc::new(RetentionPruner::new(config.retention)),
            trigger: trigger(&config.retention_prune_schedule),
        },
    ]
}

/// Spawns job loops sharing one store and one clock.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn LocationStore>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn LocationStore>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            clock,
            cancel,
        }
    }

    /// Start one task per job.
    pub fn spawn_all(&self, jobs: Vec<ScheduledJob>) -> Vec<JoinHandle<()>> {
        jobs.into_iter().map(|job| self.spawn(job)).collect()
    }

    /// Start the trigger loop for one job. The task ends once the
    /// cancellation token fires; a run already in progress is finished
    /// first.
    pub fn spawn(&self, scheduled: ScheduledJob) -> JoinHandle<()> {
        let ScheduledJob { job, trigger } = scheduled;
        let store = self.store.clone();
        let clock = self.clock.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tracing::info!(
                job = job.name(),
                schedule = %trigger.schedule,
                time_zone = %trigger.time_zone,
                region = %trigger.region,
                "Job scheduled"
            );

            let mut last_fire: Option<DateTime<Utc>> = None;

            loop {
                let now = clock.now();
                // Never fire the same slot twice, even if the clock lags the timer.
                let after = last_fire.map_or(now, |last| last.max(now));
                let Some(next) = trigger.next_after(after) else {
                    tracing::warn!(job = job.name(), "Schedule has no upcoming fire time");
                    break;
                };

                tracing::debug!(
                    job = job.name(),
                    next_run = %format_utc_rfc3339(next),
                    "Waiting for next run"
                );

                let wait = (next - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
                last_fire = Some(next);

                let span = tracing::info_span!(
                    "job",
                    job = job.name(),
                    region = %trigger.region,
                );

                match run_job(job.as_ref(), store.as_ref(), clock.as_ref())
                    .instrument(span)
                    .await
                {
                    Ok(report) => {
                        tracing::debug!(
                            job = report.job,
                            started_at = %format_utc_rfc3339(report.started_at),
                            matched = report.matched,
                            written = report.written,
                            "Job run finished"
                        );
                    }
                    Err(e) => {
                        // Picked up by log-based alerting; the next tick retries.
                        tracing::error!(job = job.name(), error = %e, "Job run failed");
                    }
                }
            }

            tracing::info!(job = job.name(), "Job loop stopped");
        })
    }
}
