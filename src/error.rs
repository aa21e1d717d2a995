// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the storage layer and the jobs.

/// Errors that end a job invocation.
///
/// None of these are retried locally; the scheduler logs them and the next
/// tick re-evaluates the same predicates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Batch write incomplete: {failed} of {total} writes failed")]
    BatchWrite { failed: usize, total: usize },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the error came from the write half of a run, after the query
    /// already succeeded.
    pub fn is_partial_write(&self) -> bool {
        matches!(self, AppError::BatchWrite { failed, total } if failed < total)
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
