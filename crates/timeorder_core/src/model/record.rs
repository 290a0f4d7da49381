//! Shared record metadata for soft-delete tables.
//!
//! # Responsibility
//! - Define the bookkeeping columns every persisted entity carries.
//! - Expose lifecycle helpers for the soft-delete marker.
//!
//! # Invariants
//! - `removed_at` is either `NOT_REMOVED` (`0`) or a positive epoch second.
//! - `id` is stable and never reused for another record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one persisted record.
pub type RecordId = Uuid;

/// Sentinel stored in `removed_at` for live rows.
pub const NOT_REMOVED: i64 = 0;

pub const ID_COLUMN: &str = "id";
pub const REMOVED_AT_COLUMN: &str = "removed_at";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const MODIFIED_AT_COLUMN: &str = "modified_at";

/// Bookkeeping columns owned by the repository layer, in storage order.
pub const META_COLUMNS: [&str; 4] = [
    ID_COLUMN,
    REMOVED_AT_COLUMN,
    CREATED_AT_COLUMN,
    MODIFIED_AT_COLUMN,
];

/// Lifecycle state derived from `removed_at`.
///
/// Hard-deleted records have no in-memory representation: the row is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Live,
    SoftDeleted { removed_at: i64 },
}

/// Metadata stored alongside every entity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: RecordId,
    /// Epoch seconds of the soft delete, `0` while live.
    pub removed_at: i64,
    /// Epoch seconds of the first save. Informational.
    pub created_at: i64,
    /// Epoch seconds of the latest write. Informational.
    pub modified_at: i64,
}

impl RecordMeta {
    /// Creates live metadata with a generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates live metadata for an id that already exists elsewhere.
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id,
            removed_at: NOT_REMOVED,
            created_at: 0,
            modified_at: 0,
        }
    }

    pub fn is_live(&self) -> bool {
        self.removed_at == NOT_REMOVED
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.is_live() {
            Lifecycle::Live
        } else {
            Lifecycle::SoftDeleted {
                removed_at: self.removed_at,
            }
        }
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}
