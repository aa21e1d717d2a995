// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Query predicates and field-level mutations issued by the jobs.

use super::location::{fields, LocationPath, LocationRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `isSharing == is_sharing AND updatedAt < updated_before` over every
/// `locations` sub-collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationQuery {
    pub is_sharing: bool,
    pub updated_before: DateTime<Utc>,
}

impl LocationQuery {
    pub fn matches(&self, record: &LocationRecord) -> bool {
        record.is_sharing == self.is_sharing && record.updated_at < self.updated_before
    }
}

/// A field-level change to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUpdate {
    /// `isSharing = false`, `autoOffAt = <server time>`.
    DisableSharing,
    /// Delete the positional fields and set `stale = true`.
    PurgePosition,
}

impl LocationUpdate {
    /// Fields named in the update mask. A masked field missing from
    /// [`Self::patch`] is deleted on the server.
    pub fn field_mask(&self) -> Vec<&'static str> {
        match self {
            LocationUpdate::DisableSharing => vec![fields::IS_SHARING],
            LocationUpdate::PurgePosition => {
                let mut mask = fields::POSITIONAL.to_vec();
                mask.push(fields::STALE);
                mask
            }
        }
    }

    /// Document body sent with the mask.
    pub fn patch(&self) -> LocationPatch {
        match self {
            LocationUpdate::DisableSharing => LocationPatch {
                is_sharing: Some(false),
                stale: None,
            },
            LocationUpdate::PurgePosition => LocationPatch {
                is_sharing: None,
                stale: Some(true),
            },
        }
    }

    /// Field set to the server's request time, if any.
    pub fn server_timestamp_field(&self) -> Option<&'static str> {
        match self {
            LocationUpdate::DisableSharing => Some(fields::AUTO_OFF_AT),
            LocationUpdate::PurgePosition => None,
        }
    }

    /// Apply to an in-memory copy, using `server_time` for timestamp fields.
    pub fn apply_to(&self, record: &mut LocationRecord, server_time: DateTime<Utc>) {
        match self {
            LocationUpdate::DisableSharing => record.disable_sharing(server_time),
            LocationUpdate::PurgePosition => record.purge_position(),
        }
    }
}

/// Body of a masked update. Only the fields that are set get serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sharing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
}

/// One write in a grouped batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMutation {
    pub path: LocationPath,
    pub update: LocationUpdate,
}

/// Result of submitting a batch of mutations.
///
/// Writes within a batch succeed or fail independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub written: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.written + self.failed
    }

    pub fn merge(self, other: BatchOutcome) -> BatchOutcome {
        BatchOutcome {
            written: self.written + other.written,
            failed: self.failed + other.failed,
        }
    }
}
