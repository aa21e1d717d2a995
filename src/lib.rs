// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location-Janitor: scheduled maintenance for shared locations
//!
//! This crate runs the periodic jobs that switch off abandoned
//! location-sharing sessions and scrub positions from long-idle records
//! in Firestore.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod time_utils;

use config::Config;
use scheduler::ScheduledJob;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub jobs: Vec<ScheduledJob>,
}
