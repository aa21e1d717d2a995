// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory location store.
//!
//! Evaluates queries and applies updates with the same semantics as the
//! Firestore adapter, so the jobs can be exercised without an emulator.

use crate::clock::Clock;
use crate::db::LocationStore;
use crate::error::Result;
use crate::models::{
    BatchOutcome, LocationDoc, LocationMutation, LocationPath, LocationQuery, LocationRecord,
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `DashMap`-backed store keyed by document path.
#[derive(Clone)]
pub struct MemoryLocationStore {
    docs: Arc<DashMap<LocationPath, LocationRecord>>,
    /// Paths whose writes are refused, as if the server rejected them
    rejected: Arc<DashSet<LocationPath>>,
    /// Source of "server" timestamps
    clock: Arc<dyn Clock>,
    queries: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryLocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            docs: Arc::new(DashMap::new()),
            rejected: Arc::new(DashSet::new()),
            clock,
            queries: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Write a record as the client would. Not counted as a job write.
    pub fn insert(&self, path: LocationPath, record: LocationRecord) {
        self.docs.insert(path, record);
    }

    pub fn get(&self, path: &LocationPath) -> Option<LocationRecord> {
        self.docs.get(path).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, path: &LocationPath) -> Option<LocationRecord> {
        self.docs.remove(path).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Make every future write to `path` fail.
    pub fn reject_writes_to(&self, path: LocationPath) {
        self.rejected.insert(path);
    }

    /// Undo [`Self::reject_writes_to`].
    pub fn accept_writes_to(&self, path: &LocationPath) {
        self.rejected.remove(path);
    }

    /// Number of `find` calls so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of successful job writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of every record, sorted by path for stable comparisons.
    pub fn snapshot(&self) -> Vec<LocationDoc> {
        let mut docs: Vec<LocationDoc> = self
            .docs
            .iter()
            .map(|entry| LocationDoc::new(entry.key().clone(), entry.value().clone()))
            .collect();
        docs.sort_by_key(|doc| doc.path.to_string());
        docs
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn find(&self, query: &LocationQuery) -> Result<Vec<LocationDoc>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .docs
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| LocationDoc::new(entry.key().clone(), entry.value().clone()))
            .collect())
    }

    async fn apply(&self, mutations: &[LocationMutation]) -> Result<BatchOutcome> {
        let server_time = self.clock.now();
        let mut outcome = BatchOutcome::default();

        for mutation in mutations {
            if self.rejected.contains(&mutation.path) {
                outcome.failed += 1;
                continue;
            }

            // Same as the `Exists` precondition: a vanished document is not recreated.
            match self.docs.get_mut(&mutation.path) {
                Some(mut record) => {
                    mutation.update.apply_to(record.value_mut(), server_time);
                    self.writes.fetch_add(1, Ordering::SeqCst);
                    outcome.written += 1;
                }
                None => outcome.failed += 1,
            }
        }

        Ok(outcome)
    }
}
