// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user location record as written by the mobile client.

use crate::db::collections;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Firestore field names.
pub mod fields {
    pub const IS_SHARING: &str = "isSharing";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const AUTO_OFF_AT: &str = "autoOffAt";
    pub const STALE: &str = "stale";
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
    pub const ACCURACY: &str = "accuracy";
    pub const SPEED: &str = "speed";
    pub const HEADING: &str = "heading";

    /// Fields removed when a record is pruned.
    pub const POSITIONAL: [&str; 5] = [LAT, LNG, ACCURACY, SPEED, HEADING];
}

/// Location document stored at `users/{owner}/locations/{id}`.
///
/// Positional fields are `None` when absent from the document. They are
/// never written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Whether the owner is currently broadcasting
    pub is_sharing: bool,
    /// Last client write
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Degrees from north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Set when sharing was switched off by the timeout sweep
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "firestore::serialize_as_optional_timestamp"
    )]
    pub auto_off_at: Option<DateTime<Utc>>,
    /// Set once positional fields have been purged
    #[serde(default)]
    pub stale: bool,
}

impl LocationRecord {
    /// A live record with a position, as the client writes it.
    pub fn sharing_at(lat: f64, lng: f64, updated_at: DateTime<Utc>) -> Self {
        Self {
            is_sharing: true,
            updated_at,
            lat: Some(lat),
            lng: Some(lng),
            accuracy: None,
            speed: None,
            heading: None,
            auto_off_at: None,
            stale: false,
        }
    }

    /// True if any positional field is present.
    pub fn has_position(&self) -> bool {
        self.lat.is_some()
            || self.lng.is_some()
            || self.accuracy.is_some()
            || self.speed.is_some()
            || self.heading.is_some()
    }

    /// Already reduced to a tombstone; pruning again would change nothing.
    pub fn is_purged(&self) -> bool {
        self.stale && !self.has_position()
    }

    pub fn disable_sharing(&mut self, at: DateTime<Utc>) {
        self.is_sharing = false;
        self.auto_off_at = Some(at);
    }

    pub fn purge_position(&mut self) {
        self.lat = None;
        self.lng = None;
        self.accuracy = None;
        self.speed = None;
        self.heading = None;
        self.stale = true;
    }
}

/// Address of a location document.
///
/// `parent` is the owning user's document path. For documents read from
/// Firestore it is the full resource name prefix
/// (`projects/{p}/databases/{d}/documents/users/{owner}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationPath {
    parent: String,
    document_id: String,
}

/// A document name that does not point into a `locations` collection.
#[derive(Debug, thiserror::Error)]
#[error("Not a location document path: {0}")]
pub struct InvalidLocationPath(pub String);

impl LocationPath {
    pub fn new(parent: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            document_id: document_id.into(),
        }
    }

    /// `users/{owner}/locations/{document_id}`
    pub fn for_user(owner: &str, document_id: impl Into<String>) -> Self {
        Self::new(format!("{}/{}", collections::USERS, owner), document_id)
    }

    /// Split a document name into parent path and id.
    pub fn parse(name: &str) -> Result<Self, InvalidLocationPath> {
        let mut parts = name.rsplitn(3, '/');
        let (Some(id), Some(collection), Some(parent)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(InvalidLocationPath(name.to_string()));
        };

        if collection != collections::LOCATIONS
            || id.is_empty()
            || parent.is_empty()
            || !parent.contains('/')
        {
            return Err(InvalidLocationPath(name.to_string()));
        }

        Ok(Self::new(parent, id))
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The owning user's id: the last segment of the parent path.
    pub fn owner(&self) -> &str {
        self.parent
            .rsplit('/')
            .next()
            .unwrap_or(self.parent.as_str())
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.parent,
            collections::LOCATIONS,
            self.document_id
        )
    }
}

/// A matched document together with where it lives.
///
/// `record` is `None` when the stored body could not be decoded. The
/// document still matched the query, so it is still updated.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDoc {
    pub path: LocationPath,
    pub record: Option<LocationRecord>,
}

impl LocationDoc {
    pub fn new(path: LocationPath, record: LocationRecord) -> Self {
        Self {
            path,
            record: Some(record),
        }
    }

    /// A matched document whose body could not be read.
    pub fn undecodable(path: LocationPath) -> Self {
        Self { path, record: None }
    }

    /// Already a tombstone. Unreadable bodies never count as purged.
    pub fn is_purged(&self) -> bool {
        self.record.as_ref().is_some_and(LocationRecord::is_purged)
    }
}
