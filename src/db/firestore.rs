// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides:
//! - Collection-group queries over every user's `locations` sub-collection
//! - Grouped, non-atomic field-level updates (`BatchWrite`)
//! - Single-document helpers used to seed and inspect records

use crate::db::{collections, LocationStore};
use crate::error::AppError;
use crate::models::location::fields;
use crate::models::{
    BatchOutcome, LocationDoc, LocationMutation, LocationPath, LocationQuery, LocationRecord,
};
use async_trait::async_trait;
use firestore::{
    FirestoreBatch, FirestoreSimpleBatchWriter, FirestoreTransformServerValue,
    FirestoreWritePrecondition,
};
use futures_util::{stream, StreamExt};
use gcloud_sdk::google::firestore::v1::Document;
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_BATCHES: usize = 4;
// BatchWrite accepts at most 500 writes per request.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // The emulator accepts any bearer token; hand it an unsigned one.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Single-Document Operations ──────────────────────────────

    /// Full resource path of `users/{owner}/locations/{document_id}`.
    pub fn user_location_path(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<LocationPath, AppError> {
        let parent = format!(
            "{}/{}/{}",
            self.get_client()?.get_documents_path(),
            collections::USERS,
            owner
        );
        Ok(LocationPath::new(parent, document_id))
    }

    /// Read one location record.
    pub async fn get_location(
        &self,
        path: &LocationPath,
    ) -> Result<Option<LocationRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOCATIONS)
            .parent(path.parent())
            .obj()
            .one(path.document_id())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a location document, the way the client does on each update.
    ///
    /// Generic over the body so records the client wrote in an older or
    /// broken shape can be stored as well.
    pub async fn set_location<T>(&self, path: &LocationPath, record: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOCATIONS)
            .document_id(path.document_id())
            .parent(path.parent())
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read a location document without decoding it.
    pub async fn get_location_document(
        &self,
        path: &LocationPath,
    ) -> Result<Option<Document>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOCATIONS)
            .parent(path.parent())
            .one(path.document_id())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a location document, as account deletion does.
    pub async fn delete_location(&self, path: &LocationPath) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LOCATIONS)
            .document_id(path.document_id())
            .parent(path.parent())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Sweep Operations ─────────────────────────────────────────

    /// Run `query` as a collection-group query over `locations`.
    ///
    /// Needs the composite index declared in `firestore.indexes.json`.
    pub async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<LocationDoc>, AppError> {
        let LocationQuery {
            is_sharing,
            updated_before,
        } = *query;

        let documents = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LOCATIONS)
            .all_descendants()
            .filter(move |q| {
                q.for_all([
                    q.field(fields::IS_SHARING).eq(is_sharing),
                    q.field(fields::UPDATED_AT)
                        .less_than(firestore::FirestoreTimestamp(updated_before)),
                ])
            })
            .query()
            .await
            .map_err(|e| AppError::Query(e.to_string()))?;

        Ok(documents.iter().filter_map(location_doc_from).collect())
    }

    /// Submit mutations through `BatchWrite`, in chunks of [`BATCH_SIZE`].
    ///
    /// Chunks are written concurrently. A chunk that fails as a whole counts
    /// every write in it as failed; the remaining chunks still go out.
    pub async fn apply_mutations(
        &self,
        mutations: &[LocationMutation],
    ) -> Result<BatchOutcome, AppError> {
        if mutations.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let client = self.get_client()?;
        let batch_writer = client
            .create_simple_batch_writer()
            .await
            .map_err(|e| AppError::Database(format!("Failed to create batch writer: {}", e)))?;

        let chunk_writes: Vec<_> = mutations
            .chunks(BATCH_SIZE)
            .map(|chunk| write_chunk(client, &batch_writer, chunk))
            .collect();

        let outcomes: Vec<BatchOutcome> = stream::iter(chunk_writes)
            .buffer_unordered(MAX_CONCURRENT_BATCHES)
            .collect()
            .await;

        Ok(outcomes
            .into_iter()
            .fold(BatchOutcome::default(), BatchOutcome::merge))
    }
}

/// Build a [`LocationDoc`] from a query result.
///
/// A body that does not decode still yields its path, so one malformed
/// client record cannot stall a sweep for everybody else.
fn location_doc_from(doc: &Document) -> Option<LocationDoc> {
    let path = match LocationPath::parse(&doc.name) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping document outside a locations collection");
            return None;
        }
    };

    match firestore::FirestoreDb::deserialize_doc_to::<LocationRecord>(doc) {
        Ok(record) => Some(LocationDoc::new(path, record)),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Location record does not decode");
            Some(LocationDoc::undecodable(path))
        }
    }
}

/// Write one chunk as a single `BatchWrite` request.
///
/// A chunk that fails as a whole counts every write in it as failed.
async fn write_chunk(
    client: &firestore::FirestoreDb,
    batch_writer: &FirestoreSimpleBatchWriter,
    chunk: &[LocationMutation],
) -> BatchOutcome {
    let mut batch = batch_writer.new_batch();
    let mut rejected = 0;

    for mutation in chunk {
        if let Err(e) = add_to_batch(client, &mut batch, mutation) {
            tracing::warn!(
                path = %mutation.path,
                error = %e,
                "Failed to add location update to batch"
            );
            rejected += 1;
        }
    }

    let submitted = chunk.len() - rejected;
    if submitted == 0 {
        return BatchOutcome {
            written: 0,
            failed: rejected,
        };
    }

    match batch.write().await {
        Ok(response) => {
            let failed = response
                .statuses
                .iter()
                .filter(|status| status.code != 0)
                .count();
            if failed > 0 {
                tracing::warn!(failed, submitted, "Batch write partially failed");
            }
            BatchOutcome {
                written: submitted - failed,
                failed: failed + rejected,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, submitted, "Batch write failed");
            BatchOutcome {
                written: 0,
                failed: chunk.len(),
            }
        }
    }
}

/// Add one masked update to `batch`.
///
/// Fields named in the mask but missing from the patch are deleted by
/// Firestore. The `Exists` precondition keeps the job from recreating a
/// document the client removed in the meantime.
fn add_to_batch(
    client: &firestore::FirestoreDb,
    batch: &mut FirestoreBatch<'_, FirestoreSimpleBatchWriter>,
    mutation: &LocationMutation,
) -> firestore::FirestoreResult<()> {
    let patch = mutation.update.patch();

    let builder = client
        .fluent()
        .update()
        .fields(mutation.update.field_mask())
        .in_col(collections::LOCATIONS)
        .precondition(FirestoreWritePrecondition::Exists(true))
        .document_id(mutation.path.document_id())
        .parent(mutation.path.parent())
        .object(&patch);

    match mutation.update.server_timestamp_field() {
        Some(field) => {
            builder
                .transforms(|t| {
                    t.fields([t
                        .field(field)
                        .server_value(FirestoreTransformServerValue::RequestTime)])
                })
                .add_to_batch(batch)?;
        }
        None => {
            builder.add_to_batch(batch)?;
        }
    }

    Ok(())
}

#[async_trait]
impl LocationStore for FirestoreDb {
    async fn find(&self, query: &LocationQuery) -> Result<Vec<LocationDoc>, AppError> {
        self.find_locations(query).await
    }

    async fn apply(&self, mutations: &[LocationMutation]) -> Result<BatchOutcome, AppError> {
        self.apply_mutations(mutations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gcloud_sdk::google::firestore::v1::{value::ValueType, Value};

    const NAME: &str = "projects/p/databases/(default)/documents/users/alice/locations/current";

    fn stored(record: &LocationRecord) -> Document {
        firestore::FirestoreDb::serialize_to_doc(NAME, record).unwrap()
    }

    fn record() -> LocationRecord {
        let mut record = LocationRecord::sharing_at(
            52.5,
            13.4,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        record.heading = Some(90.0);
        record
    }

    #[test]
    fn test_well_formed_document_decodes() {
        let doc = location_doc_from(&stored(&record())).unwrap();

        assert_eq!(doc.path.owner(), "alice");
        assert_eq!(doc.record, Some(record()));
    }

    #[test]
    fn test_null_stale_keeps_the_document() {
        let mut raw = stored(&record());
        raw.fields.insert(
            fields::STALE.to_string(),
            Value {
                value_type: Some(ValueType::NullValue(0)),
            },
        );

        let doc = location_doc_from(&raw).unwrap();

        assert_eq!(doc.path.document_id(), "current");
        assert!(doc.record.is_none());
        assert!(!doc.is_purged());
    }

    #[test]
    fn test_non_numeric_heading_keeps_the_document() {
        let mut raw = stored(&record());
        raw.fields.insert(
            fields::HEADING.to_string(),
            Value {
                value_type: Some(ValueType::StringValue("N".to_string())),
            },
        );

        let doc = location_doc_from(&raw).unwrap();

        assert_eq!(doc.path.owner(), "alice");
        assert!(doc.record.is_none());
    }

    #[test]
    fn test_document_outside_locations_is_skipped() {
        let mut raw = stored(&record());
        raw.name = "projects/p/databases/(default)/documents/users/alice".to_string();

        assert!(location_doc_from(&raw).is_none());
    }
}
