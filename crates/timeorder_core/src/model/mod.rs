//! Domain model for soft-delete, time-ordered tables.
//!
//! # Responsibility
//! - Define record metadata shared by every table.
//! - Define the reverse-time sort key and query windows.
//!
//! # Invariants
//! - Deletion is represented by a `removed_at` stamp unless a hard delete is
//!   requested explicitly.
//! - A record's timestamp is always derived from its stored sort key.

pub mod record;
pub mod time_order;
