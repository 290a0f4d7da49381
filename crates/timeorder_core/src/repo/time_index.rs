//! Reverse-chronological reads over the `time_order` column.
//!
//! # Responsibility
//! - Answer "most recent N", "what was true as of t" and windowed queries
//!   from the single ascending `time_order` index.
//! - Apply the anchored range walk for `get_by_range`.
//!
//! # Invariants
//! - Results are most-recent-first (`time_order ASC`).
//! - `start > end` and bounds of `i64::MIN` fail before the store is touched.
//! - All reads go through `SoftDeleteRepository`, so only live rows appear.

use crate::model::time_order::{TimeOrdered, TimeWindow, TIME_ORDER_COLUMN};
use crate::query::predicate::{Direction, Predicate};
use crate::query::range::{anchor_fetch_predicates, range_predicates, AnchoredRangeExt};
use crate::repo::error::RepoResult;
use crate::repo::soft_delete::{Read, SoftDeleteRepository};
use crate::store::{Entity, Store};
use log::debug;
use std::time::Instant;

/// Time-ordered view over a soft-delete repository.
pub struct ReverseTimeIndex<'repo, S> {
    repo: &'repo SoftDeleteRepository<S>,
}

impl<'repo, S> ReverseTimeIndex<'repo, S>
where
    S: Store,
    S::Record: TimeOrdered,
{
    pub fn new(repo: &'repo SoftDeleteRepository<S>) -> Self {
        Self { repo }
    }

    /// Live rows with `start <= timestamp <= end`, most-recent-first.
    ///
    /// Plain bounded read; no anchor row is added.
    pub fn read_time_range(
        &self,
        filters: impl IntoIterator<Item = Predicate>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> RepoResult<Read<'repo, S>> {
        let window = TimeWindow::new(start, end)?;
        let bounds = range_predicates(window.start(), window.end())?;
        Ok(self
            .repo
            .read(filters)
            .filters(bounds)
            .order_by(TIME_ORDER_COLUMN, Direction::Asc))
    }

    /// Records in `[start, end]` plus the anchor: the most recent record at or
    /// before `start`. Most-recent-first.
    ///
    /// Rows older than the anchor are never pulled from the store.
    pub fn get_by_range(
        &self,
        filters: impl IntoIterator<Item = Predicate>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> RepoResult<Vec<S::Record>> {
        let window = TimeWindow::new(start, end)?;
        let bounds = anchor_fetch_predicates(&window)?;
        let started_at = Instant::now();

        let records: Vec<S::Record> = self
            .repo
            .read(filters)
            .filters(bounds)
            .order_by(TIME_ORDER_COLUMN, Direction::Asc)
            .scan(|rows| rows.anchored(window.start()).collect())?;

        debug!(
            "event=range_query module=repo status=ok table={} start={:?} end={:?} returned={} duration_ms={}",
            <S::Record as Entity>::TABLE,
            window.start(),
            window.end(),
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// The `limit` most recent live records.
    pub fn most_recent(
        &self,
        filters: impl IntoIterator<Item = Predicate>,
        limit: u32,
    ) -> RepoResult<Vec<S::Record>> {
        self.repo
            .read(filters)
            .order_by(TIME_ORDER_COLUMN, Direction::Asc)
            .limit(limit)
            .all()
    }

    /// The most recent live record with `timestamp <= at`.
    pub fn as_of(
        &self,
        filters: impl IntoIterator<Item = Predicate>,
        at: i64,
    ) -> RepoResult<Option<S::Record>> {
        let bound = range_predicates(None, Some(at))?;
        self.repo
            .read(filters)
            .filters(bound)
            .order_by(TIME_ORDER_COLUMN, Direction::Asc)
            .limit(1)
            .first()
    }
}

impl<S: Store> SoftDeleteRepository<S>
where
    S::Record: TimeOrdered,
{
    /// Reverse-time view of this repository.
    pub fn time_index(&self) -> ReverseTimeIndex<'_, S> {
        ReverseTimeIndex::new(self)
    }
}
