//! Soft-delete repository over any `Store`.
//!
//! # Responsibility
//! - Conjoin the live-row filter into every read unless removed rows are
//!   requested explicitly.
//! - Stamp `removed_at` on soft delete; issue physical deletion only on
//!   explicit hard delete.
//! - Stamp `created_at`/`modified_at` on writes from the repository clock.
//!
//! # Invariants
//! - Live reads never observe rows with `removed_at != 0`.
//! - A soft delete writes a positive `removed_at`.
//! - A failed write leaves the caller's record as it was.
//! - Every write flushes unless the caller defers it.

use crate::clock::{Clock, SystemClock};
use crate::config::{RestampPolicy, SoftDeleteConfig};
use crate::model::record::{RecordId, ID_COLUMN, NOT_REMOVED, REMOVED_AT_COLUMN};
use crate::query::predicate::{Direction, Predicate, Query};
use crate::repo::error::{RepoError, RepoResult};
use crate::store::{Entity, RecordCursor, Store};
use log::{debug, info};
use rusqlite::types::Value;
use std::sync::Arc;
use std::time::Instant;

/// Whether a delete keeps the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Stamp `removed_at` and keep the row.
    #[default]
    Soft,
    /// Remove the row from storage.
    Hard,
}

/// Whether a write commits before returning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flush {
    #[default]
    Now,
    /// Leave the write pending in the caller's unit of work.
    Deferred,
}

/// Repository applying soft-delete semantics on top of a store.
pub struct SoftDeleteRepository<S> {
    store: S,
    clock: Arc<dyn Clock>,
    restamp: RestampPolicy,
}

impl<S: Store> SoftDeleteRepository<S> {
    /// Wraps `store` with the system clock and default soft-delete settings.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &SoftDeleteConfig::default())
    }

    pub fn with_config(store: S, config: &SoftDeleteConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            restamp: config.restamp,
        }
    }

    /// Replaces the time source used for stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Lazy read over rows matching every predicate.
    ///
    /// Nothing executes until the returned `Read` is consumed.
    pub fn read(&self, predicates: impl IntoIterator<Item = Predicate>) -> Read<'_, S> {
        Read {
            repo: self,
            query: Query::new().filters(predicates),
            include_removed: false,
        }
    }

    /// Equality-only form of `read`.
    pub fn read_by<V>(&self, equalities: impl IntoIterator<Item = (&'static str, V)>) -> Read<'_, S>
    where
        V: Into<Value>,
    {
        self.read(
            equalities
                .into_iter()
                .map(|(column, value)| Predicate::eq(column, value)),
        )
    }

    /// First live row matching `equalities`; `NoMatchingRecord` when none does.
    pub fn read_one_by<V>(
        &self,
        equalities: impl IntoIterator<Item = (&'static str, V)>,
    ) -> RepoResult<S::Record>
    where
        V: Into<Value>,
    {
        self.read_by(equalities).one()
    }

    /// Point lookup by id.
    pub fn get(&self, id: RecordId, include_removed: bool) -> RepoResult<Option<S::Record>> {
        self.read([Predicate::eq(ID_COLUMN, id.to_string())])
            .include_removed(include_removed)
            .first()
    }

    /// Inserts or overwrites `record`, stamping its timestamps.
    pub fn save(&self, record: &mut S::Record, flush: Flush) -> RepoResult<()> {
        let previous = record.meta().clone();
        let now = self.clock.now();
        let meta = record.meta_mut();
        if meta.created_at == 0 {
            meta.created_at = now;
        }
        meta.modified_at = now;

        if let Err(err) = self.store.insert_or_update(record) {
            *record.meta_mut() = previous;
            return Err(err);
        }
        self.finish_write(flush)
    }

    /// Deletes `record` according to `mode`.
    ///
    /// Under `RestampPolicy::FirstWins` the stored row, not `record`, decides
    /// whether a stamp already exists. On error `record` keeps its previous
    /// metadata.
    ///
    /// # Errors
    /// - `NotFound` when the row is already gone (both modes).
    pub fn delete(
        &self,
        record: &mut S::Record,
        mode: DeleteMode,
        flush: Flush,
    ) -> RepoResult<()> {
        let id = record.meta().id;
        match mode {
            DeleteMode::Soft => {
                if self.restamp == RestampPolicy::FirstWins {
                    let stored = self.get(id, true)?.ok_or(RepoError::NotFound(id))?;
                    let stored_removed_at = stored.meta().removed_at;
                    if stored_removed_at != NOT_REMOVED {
                        record.meta_mut().removed_at = stored_removed_at;
                        debug!(
                            "event=record_delete module=repo status=skipped mode=soft table={} id={}",
                            <S::Record as Entity>::TABLE,
                            id
                        );
                        return self.finish_write(flush);
                    }
                }

                let previous = record.meta().clone();
                let now = self.clock.now();
                let meta = record.meta_mut();
                meta.removed_at = removal_stamp(now);
                meta.modified_at = now;
                if let Err(err) = self.store.update(record) {
                    *record.meta_mut() = previous;
                    return Err(err);
                }
            }
            DeleteMode::Hard => self.store.physically_delete(id)?,
        }

        info!(
            "event=record_delete module=repo status=ok mode={} table={} id={}",
            match mode {
                DeleteMode::Soft => "soft",
                DeleteMode::Hard => "hard",
            },
            <S::Record as Entity>::TABLE,
            id
        );
        self.finish_write(flush)
    }

    /// Opens a unit of work for deferred writes.
    pub fn begin(&self) -> RepoResult<()> {
        self.store.begin()
    }

    /// Commits writes deferred with `Flush::Deferred`.
    pub fn flush(&self) -> RepoResult<()> {
        self.store.flush()
    }

    fn finish_write(&self, flush: Flush) -> RepoResult<()> {
        match flush {
            Flush::Now => self.store.flush(),
            Flush::Deferred => Ok(()),
        }
    }
}

/// `removed_at` must stay distinguishable from the live sentinel.
fn removal_stamp(now: i64) -> i64 {
    now.max(NOT_REMOVED + 1)
}

/// Lazy, restartable read built by `SoftDeleteRepository`.
///
/// Each consuming call re-executes the query against the store.
pub struct Read<'repo, S> {
    repo: &'repo SoftDeleteRepository<S>,
    query: Query,
    include_removed: bool,
}

impl<S: Store> Read<'_, S> {
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.query = self.query.filter(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.query = self.query.filters(predicates);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.query = self.query.order_by(column, direction);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    /// Includes soft-deleted rows when `include` is true.
    pub fn include_removed(mut self, include: bool) -> Self {
        self.include_removed = include;
        self
    }

    /// The query sent to the store, live-row filter included.
    pub fn effective_query(&self) -> Query {
        if self.include_removed {
            self.query.clone()
        } else {
            self.query
                .clone()
                .prefilter(Predicate::eq(REMOVED_AT_COLUMN, NOT_REMOVED))
        }
    }

    /// Streams matching rows through `visit`; stopping early stops the read.
    pub fn scan<T, F>(&self, visit: F) -> RepoResult<T>
    where
        F: FnOnce(&mut RecordCursor<'_, S::Record>) -> RepoResult<T>,
    {
        let started_at = Instant::now();
        let result = self.repo.store.scan(&self.effective_query(), visit);
        debug!(
            "event=repo_read module=repo status={} table={} include_removed={} duration_ms={}",
            if result.is_ok() { "ok" } else { "error" },
            <S::Record as Entity>::TABLE,
            self.include_removed,
            started_at.elapsed().as_millis()
        );
        result
    }

    pub fn all(&self) -> RepoResult<Vec<S::Record>> {
        self.scan(|rows| rows.collect())
    }

    pub fn first(&self) -> RepoResult<Option<S::Record>> {
        self.scan(|rows| rows.next().transpose())
    }

    /// First matching row; `NoMatchingRecord` when there is none.
    pub fn one(&self) -> RepoResult<S::Record> {
        self.first()?.ok_or(RepoError::NoMatchingRecord {
            table: <S::Record as Entity>::TABLE,
        })
    }
}
