// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod mutation;

pub use location::{LocationDoc, LocationPath, LocationRecord};
pub use mutation::{BatchOutcome, LocationMutation, LocationPatch, LocationQuery, LocationUpdate};
