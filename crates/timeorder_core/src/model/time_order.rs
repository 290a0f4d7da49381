//! Reverse-time sort key and query windows.
//!
//! # Responsibility
//! - Map an event timestamp to the stored `time_order` key and back.
//! - Validate `[start, end]` windows before they reach storage.
//!
//! # Invariants
//! - `time_order == -timestamp` always; only the sort key is stored, the
//!   timestamp is derived from it.
//! - Ascending `time_order` is most-recent-first.
//! - Timestamps lie in `[MIN_TIMESTAMP, i64::MAX]`; `i64::MIN` has no
//!   negation and is rejected, both as a timestamp and as a sort key.
//! - A window with both bounds has `start <= end`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column holding the negated timestamp.
pub const TIME_ORDER_COLUMN: &str = "time_order";

/// Smallest timestamp with a sort key.
pub const MIN_TIMESTAMP: i64 = i64::MIN + 1;

/// Negated timestamp used as an ascending sort key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimeOrder(i64);

impl TimeOrder {
    pub fn from_timestamp(timestamp: i64) -> Result<Self, InvalidTimestamp> {
        timestamp
            .checked_neg()
            .map(Self)
            .ok_or(InvalidTimestamp { value: timestamp })
    }

    /// Rebuilds the key from a persisted `time_order` value.
    pub fn from_sort_key(sort_key: i64) -> Result<Self, InvalidTimestamp> {
        if sort_key == i64::MIN {
            return Err(InvalidTimestamp { value: sort_key });
        }
        Ok(Self(sort_key))
    }

    pub fn sort_key(self) -> i64 {
        self.0
    }

    pub fn timestamp(self) -> i64 {
        -self.0
    }
}

impl TryFrom<i64> for TimeOrder {
    type Error = InvalidTimestamp;

    fn try_from(sort_key: i64) -> Result<Self, Self::Error> {
        Self::from_sort_key(sort_key)
    }
}

impl From<TimeOrder> for i64 {
    fn from(value: TimeOrder) -> Self {
        value.0
    }
}

/// Entities that can be retrieved in reverse-chronological order.
pub trait TimeOrdered {
    fn time_order(&self) -> TimeOrder;

    fn time_order_mut(&mut self) -> &mut TimeOrder;

    /// Timestamp of the event this record represents.
    fn timestamp(&self) -> i64 {
        self.time_order().timestamp()
    }

    /// Reassigns the event timestamp; the sort key follows.
    ///
    /// The record is left unchanged when `timestamp` is rejected.
    fn set_timestamp(&mut self, timestamp: i64) -> Result<(), InvalidTimestamp> {
        *self.time_order_mut() = TimeOrder::from_timestamp(timestamp)?;
        Ok(())
    }
}

/// Value outside the representable timestamp range (`i64::MIN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTimestamp {
    pub value: i64,
}

impl Display for InvalidTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timestamp {} is outside [{MIN_TIMESTAMP}, {}]",
            self.value,
            i64::MAX
        )
    }
}

impl Error for InvalidTimestamp {}

/// Window start is later than its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTimestampRange {
    pub start: i64,
    pub end: i64,
}

impl Display for InvalidTimestampRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "start_timestamp ({}) must be <= end_timestamp ({})",
            self.start, self.end
        )
    }
}

impl Error for InvalidTimestampRange {}

/// Inclusive timestamp bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<i64>,
    end: Option<i64>,
}

impl TimeWindow {
    /// Builds a window, rejecting `start > end`.
    pub fn new(start: Option<i64>, end: Option<i64>) -> Result<Self, InvalidTimestampRange> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(InvalidTimestampRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn end(&self) -> Option<i64> {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidTimestamp, InvalidTimestampRange, TimeOrder, TimeWindow, MIN_TIMESTAMP};

    #[test]
    fn sort_key_is_negated_timestamp() {
        for timestamp in [0, 1, -1, 1_700_000_000, i64::MAX, MIN_TIMESTAMP] {
            let key = TimeOrder::from_timestamp(timestamp).expect("timestamp in range");
            assert_eq!(key.sort_key(), -timestamp);
            assert_eq!(key.timestamp(), timestamp);
        }
    }

    #[test]
    fn min_value_has_no_sort_key() {
        assert_eq!(
            TimeOrder::from_timestamp(i64::MIN),
            Err(InvalidTimestamp { value: i64::MIN })
        );
        assert!(TimeOrder::from_sort_key(i64::MIN).is_err());
        assert!(TimeOrder::try_from(i64::MIN).is_err());
    }

    #[test]
    fn ascending_key_means_newest_first() {
        let older = TimeOrder::from_timestamp(MIN_TIMESTAMP).expect("min timestamp");
        let newer = TimeOrder::from_timestamp(i64::MAX).expect("max timestamp");
        assert!(newer < older);
        let twenty = TimeOrder::from_timestamp(20).expect("timestamp 20");
        let ten = TimeOrder::from_timestamp(10).expect("timestamp 10");
        assert!(twenty < ten);
    }

    #[test]
    fn window_rejects_reversed_bounds() {
        let err = TimeWindow::new(Some(10), Some(1)).unwrap_err();
        assert_eq!(err, InvalidTimestampRange { start: 10, end: 1 });
        assert!(err.to_string().contains("must be <="));
    }

    #[test]
    fn window_accepts_point_and_open_bounds() {
        assert!(TimeWindow::new(Some(5), Some(5)).is_ok());
        assert!(TimeWindow::new(Some(5), None).is_ok());
        assert!(TimeWindow::new(None, Some(5)).is_ok());

        let window = TimeWindow::new(Some(5), Some(7)).expect("ordered window");
        assert_eq!((window.start(), window.end()), (Some(5), Some(7)));
    }
}
