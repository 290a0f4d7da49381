//! Repository layer over the `Store` collaborator.
//!
//! # Responsibility
//! - Centralize the live-row filter and soft/hard delete semantics.
//! - Provide reverse-chronological range reads for time-ordered entities.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`,
//!   `InvalidTimestampRange`) in addition to store transport errors.

pub mod error;
pub mod soft_delete;
pub mod time_index;
