//! Reverse-time range predicates and anchored range selection.
//!
//! # Responsibility
//! - Translate timestamp bounds into `time_order` predicates.
//! - Trim a most-recent-first stream to `[start, end]` plus one anchor row.
//!
//! # Invariants
//! - `start` bound: `time_order <= -start`; `end` bound: `time_order >= -end`.
//! - The selector emits every row until it has emitted the first row with
//!   `timestamp <= start`, then pulls nothing more from its source.
//! - Without a start bound every source row is emitted.
//! - Bounds must have a sort key; `i64::MIN` is rejected on either side.

use crate::model::time_order::{
    InvalidTimestamp, TimeOrder, TimeOrdered, TimeWindow, TIME_ORDER_COLUMN,
};
use crate::query::predicate::Predicate;

/// Predicates bounding `time_order` to the window, both sides inclusive.
///
/// An unbounded side adds no predicate.
pub fn range_predicates(
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Vec<Predicate>, InvalidTimestamp> {
    let mut predicates = Vec::with_capacity(2);
    if let Some(start) = start {
        predicates.push(Predicate::le(
            TIME_ORDER_COLUMN,
            TimeOrder::from_timestamp(start)?.sort_key(),
        ));
    }
    if let Some(end) = end {
        predicates.push(Predicate::ge(
            TIME_ORDER_COLUMN,
            TimeOrder::from_timestamp(end)?.sort_key(),
        ));
    }
    Ok(predicates)
}

/// Predicates for the anchored walk: only the `end` side is bounded so that
/// rows older than `start` stay reachable as anchor candidates.
///
/// `start` is still checked, so both bounds are rejected alike.
pub fn anchor_fetch_predicates(window: &TimeWindow) -> Result<Vec<Predicate>, InvalidTimestamp> {
    if let Some(start) = window.start() {
        TimeOrder::from_timestamp(start)?;
    }
    range_predicates(None, window.end())
}

/// Decides, row by row, what the anchored walk keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelector {
    start: Option<i64>,
    anchored: bool,
}

impl RangeSelector {
    pub fn new(start: Option<i64>) -> Self {
        Self {
            start,
            anchored: false,
        }
    }

    /// True once the anchor has been emitted.
    pub fn is_done(&self) -> bool {
        self.anchored
    }

    /// Feeds the next timestamp in most-recent-first order.
    ///
    /// Returns whether the row belongs to the result. After the anchor every
    /// call returns `false`.
    pub fn admit(&mut self, timestamp: i64) -> bool {
        if self.anchored {
            return false;
        }
        if self.start.is_some_and(|start| timestamp <= start) {
            self.anchored = true;
        }
        true
    }

    fn finish(&mut self) {
        self.anchored = true;
    }
}

/// Iterator adapter applying `RangeSelector` to a fallible record stream.
///
/// The first error is passed through and ends the walk.
pub struct AnchoredRange<I> {
    source: I,
    selector: RangeSelector,
}

impl<I, E, X> Iterator for AnchoredRange<I>
where
    I: Iterator<Item = Result<E, X>>,
    E: TimeOrdered,
{
    type Item = Result<E, X>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.selector.is_done() {
            return None;
        }
        match self.source.next() {
            Some(Ok(record)) => {
                self.selector.admit(record.timestamp());
                Some(Ok(record))
            }
            Some(Err(err)) => {
                self.selector.finish();
                Some(Err(err))
            }
            None => {
                self.selector.finish();
                None
            }
        }
    }
}

pub trait AnchoredRangeExt: Iterator + Sized {
    /// Walks a most-recent-first stream, stopping after the anchor for `start`.
    fn anchored(self, start: Option<i64>) -> AnchoredRange<Self> {
        AnchoredRange {
            source: self,
            selector: RangeSelector::new(start),
        }
    }
}

impl<I: Iterator> AnchoredRangeExt for I {}
