// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::Duration;
use location_janitor::clock::{Clock, MockClock};
use location_janitor::config::Config;
use location_janitor::db::{FirestoreDb, MemoryLocationStore};
use location_janitor::models::{LocationPath, LocationRecord};
use location_janitor::routes::create_router;
use location_janitor::scheduler::registered_jobs;
use location_janitor::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// In-memory store whose server time follows the returned clock.
#[allow(dead_code)]
pub fn memory_store() -> (Arc<MockClock>, MemoryLocationStore) {
    let clock = Arc::new(MockClock::default());
    let store = MemoryLocationStore::new(clock.clone());
    (clock, store)
}

/// A record that is sharing and was last written `age` ago.
#[allow(dead_code)]
pub fn sharing_record(clock: &MockClock, age: Duration) -> LocationRecord {
    let mut record = LocationRecord::sharing_at(52.5, 13.4, clock.now() - age);
    record.accuracy = Some(8.0);
    record.speed = Some(1.4);
    record.heading = Some(90.0);
    record
}

/// A record that stopped sharing and was last written `age` ago.
#[allow(dead_code)]
pub fn idle_record(clock: &MockClock, age: Duration) -> LocationRecord {
    let mut record = sharing_record(clock, age);
    record.is_sharing = false;
    record
}

/// Insert `record` for `owner` and return its path.
#[allow(dead_code)]
pub fn seed(store: &MemoryLocationStore, owner: &str, record: LocationRecord) -> LocationPath {
    let path = LocationPath::for_user(owner, "current");
    store.insert(path.clone(), record);
    path
}

/// Create a test app with the default job configuration.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let jobs = registered_jobs(&config);

    let state = Arc::new(AppState { config, jobs });

    (create_router(state.clone()), state)
}
