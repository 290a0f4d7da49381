//! Persistence collaborator contracts.
//!
//! # Responsibility
//! - Describe how an entity maps to a table (`Entity`).
//! - Describe the minimal store the repository layer drives (`Store`).
//!
//! # Invariants
//! - Stores execute predicates exactly as given; the live-row filter is added
//!   by the repository, never by the store.
//! - `scan` hands out rows lazily; a visitor that stops early stops the read.

use crate::model::record::{RecordId, RecordMeta};
use crate::query::predicate::Query;
use crate::repo::error::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;

pub mod sqlite;

/// Row cursor handed to `Store::scan` visitors.
pub type RecordCursor<'a, E> = dyn Iterator<Item = RepoResult<E>> + 'a;

/// Table mapping for one record type.
///
/// Metadata columns (`id`, `removed_at`, `created_at`, `modified_at`) are
/// handled by the store; `COLUMNS` lists only entity-owned columns.
pub trait Entity: Sized {
    const TABLE: &'static str;
    /// Entity-owned columns, in the order `values()` returns them.
    const COLUMNS: &'static [&'static str];

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn values(&self) -> Vec<Value>;

    /// Decodes entity-owned columns; `meta` is already decoded.
    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self>;
}

/// Storage engine consumed by `SoftDeleteRepository`.
pub trait Store {
    type Record: Entity;

    /// Inserts the record, or overwrites the row with the same id.
    fn insert_or_update(&self, record: &Self::Record) -> RepoResult<()>;

    /// Overwrites an existing row; `NotFound` when the id is absent.
    fn update(&self, record: &Self::Record) -> RepoResult<()>;

    /// Runs `query` and lets `visit` consume the matching rows lazily.
    fn scan<T, F>(&self, query: &Query, visit: F) -> RepoResult<T>
    where
        F: FnOnce(&mut RecordCursor<'_, Self::Record>) -> RepoResult<T>;

    /// Removes the row; `NotFound` when the id is absent.
    fn physically_delete(&self, id: RecordId) -> RepoResult<()>;

    /// Opens a unit of work whose writes become durable on `flush`.
    fn begin(&self) -> RepoResult<()>;

    /// Makes pending writes durable. A no-op outside a unit of work.
    fn flush(&self) -> RepoResult<()>;
}
