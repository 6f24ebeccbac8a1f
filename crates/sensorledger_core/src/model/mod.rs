//! Domain model for sensor readings.
//!
//! # Responsibility
//! - Define the canonical data point record and its storage encoding.
//! - Centralize the alert threshold rule and message format.
//!
//! # Invariants
//! - Every record is identified by a non-empty, immutable ID.
//! - Deletion is a hard delete; there are no tombstones.

pub mod data_point;
