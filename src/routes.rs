// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP routes.
//!
//! Only a liveness probe for the container platform. Jobs cannot be
//! triggered over HTTP.

use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    pub jobs: Vec<JobInfo>,
}

/// Static description of a configured job.
#[derive(Debug, Serialize)]
pub struct JobInfo {
    pub name: String,
    pub schedule: String,
    pub time_zone: String,
    pub region: String,
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    let jobs = state
        .jobs
        .iter()
        .map(|scheduled| JobInfo {
            name: scheduled.job.name().to_string(),
            schedule: scheduled.trigger.schedule.to_string(),
            time_zone: scheduled.trigger.time_zone.name().to_string(),
            region: scheduled.trigger.region.clone(),
        })
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
        jobs,
    })
}

/// Build the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(state)
}
