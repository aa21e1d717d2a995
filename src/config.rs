//! Application configuration loaded from environment variables.
//!
//! Every value has a default matching the production deployment, so an empty
//! environment yields a working configuration.

use crate::jobs::{retention, sharing_timeout};
use chrono::Duration;
use chrono_tz::Tz;
use cron::Schedule;
use std::env;
use std::str::FromStr;

/// Region the jobs are deployed to.
pub const DEFAULT_REGION: &str = "europe-west3";
/// Time zone the cron schedules are evaluated in.
pub const DEFAULT_TIME_ZONE: &str = "Europe/Berlin";
/// Every 5 minutes (cron fields: sec min hour day month weekday).
pub const DEFAULT_SHARING_SWEEP_SCHEDULE: &str = "0 */5 * * * *";
/// Every day at 03:15.
pub const DEFAULT_RETENTION_PRUNE_SCHEDULE: &str = "0 15 3 * * *";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Deployment region, attached to job logs
    pub gcp_region: String,
    /// Health endpoint port
    pub port: u16,
    /// Zone for evaluating both schedules
    pub time_zone: Tz,
    /// Idle time before a sharing session is switched off
    pub sharing_timeout: Duration,
    /// Idle time before a non-sharing record is pruned
    pub retention: Duration,
    pub sharing_sweep_schedule: Schedule,
    pub retention_prune_schedule: Schedule,
}

impl Config {
    /// The production defaults, without reading the environment.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            gcp_region: DEFAULT_REGION.to_string(),
            port: 8080,
            time_zone: chrono_tz::Europe::Berlin,
            sharing_timeout: Duration::minutes(sharing_timeout::DEFAULT_TIMEOUT_MINUTES),
            retention: Duration::days(retention::DEFAULT_RETENTION_DAYS),
            sharing_sweep_schedule: Schedule::from_str(DEFAULT_SHARING_SWEEP_SCHEDULE)
                .expect("default sweep schedule parses"),
            retention_prune_schedule: Schedule::from_str(DEFAULT_RETENTION_PRUNE_SCHEDULE)
                .expect("default prune schedule parses"),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            time_zone: parse_time_zone(
                &env::var("JOB_TIME_ZONE").unwrap_or_else(|_| DEFAULT_TIME_ZONE.to_string()),
            )?,
            sharing_timeout: Duration::minutes(positive_int(
                "SHARING_TIMEOUT_MINUTES",
                sharing_timeout::DEFAULT_TIMEOUT_MINUTES,
            )?),
            retention: Duration::days(positive_int(
                "RETENTION_DAYS",
                retention::DEFAULT_RETENTION_DAYS,
            )?),
            sharing_sweep_schedule: schedule(
                "SHARING_SWEEP_SCHEDULE",
                DEFAULT_SHARING_SWEEP_SCHEDULE,
            )?,
            retention_prune_schedule: schedule(
                "RETENTION_PRUNE_SCHEDULE",
                DEFAULT_RETENTION_PRUNE_SCHEDULE,
            )?,
        })
    }
}

/// Parse an IANA zone name such as `Europe/Berlin`.
pub fn parse_time_zone(name: &str) -> Result<Tz, ConfigError> {
    name.trim().parse::<Tz>().map_err(|_| ConfigError::Invalid {
        key: "JOB_TIME_ZONE",
        value: name.to_string(),
    })
}

/// Parse a six-field cron expression.
pub fn parse_schedule(key: &'static str, expression: &str) -> Result<Schedule, ConfigError> {
    Schedule::from_str(expression.trim()).map_err(|_| ConfigError::Invalid {
        key,
        value: expression.to_string(),
    })
}

fn schedule(key: &'static str, default: &str) -> Result<Schedule, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_schedule(key, &value),
        Err(_) => parse_schedule(key, default),
    }
}

fn positive_int(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };

    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
