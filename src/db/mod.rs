//! Database layer (Firestore, plus an in-memory stand-in for tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryLocationStore;

use crate::error::Result;
use crate::models::{BatchOutcome, LocationDoc, LocationMutation, LocationQuery};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user sub-collection, queried as a collection group
    pub const LOCATIONS: &str = "locations";
}

/// Storage operations the jobs need.
///
/// `apply` submits writes as independent operations: a failure of one does
/// not roll back the others, and is reported in [`BatchOutcome::failed`]
/// rather than as an `Err`.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// All location records matching `query`, across every user.
    async fn find(&self, query: &LocationQuery) -> Result<Vec<LocationDoc>>;

    /// Submit `mutations` as one grouped write.
    async fn apply(&self, mutations: &[LocationMutation]) -> Result<BatchOutcome>;
}
