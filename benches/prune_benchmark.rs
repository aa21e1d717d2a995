use chrono::Duration;
use criterion::{criterion_group, criterion_main, Criterion};
use location_janitor::clock::{Clock, MockClock};
use location_janitor::db::MemoryLocationStore;
use location_janitor::jobs::{plan, RetentionPruner, SharingTimeoutSweeper};
use location_janitor::models::{LocationPath, LocationRecord};
use std::hint::black_box;
use std::sync::Arc;

const USERS: usize = 10_000;

/// A population where every user is in one of four lifecycle states.
fn populated_store(clock: &Arc<MockClock>) -> MemoryLocationStore {
    let store = MemoryLocationStore::new(clock.clone());

    for i in 0..USERS {
        let (age, sharing) = match i % 4 {
            0 => (Duration::minutes(2), true),
            1 => (Duration::minutes(40), true),
            2 => (Duration::days(2), false),
            _ => (Duration::days(30), false),
        };
        let mut record = LocationRecord::sharing_at(52.5, 13.4, clock.now() - age);
        record.is_sharing = sharing;
        store.insert(LocationPath::for_user(&format!("user-{i}"), "current"), record);
    }

    store
}

fn benchmark_plan(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let clock = Arc::new(MockClock::default());
    let store = populated_store(&clock);
    let now = clock.now();

    let mut group = c.benchmark_group("plan_10k_users");

    group.bench_function("sharing_timeout_sweep", |b| {
        let job = SharingTimeoutSweeper::default();
        b.iter(|| runtime.block_on(plan(black_box(&job), &store, now)))
    });

    group.bench_function("retention_prune", |b| {
        let job = RetentionPruner::default();
        b.iter(|| runtime.block_on(plan(black_box(&job), &store, now)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_plan);
criterion_main!(benches);
