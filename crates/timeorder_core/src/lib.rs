//! Soft-delete repositories and reverse-time range queries.
//!
//! Timestamps are stored as a negated `time_order` key so one ascending index
//! answers most-recent-first reads; `ReverseTimeIndex::get_by_range` returns a
//! window plus the record that was current at the window start.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigError, CoreConfig, LogConfig, RestampPolicy, SoftDeleteConfig, StoreConfig,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::record::{Lifecycle, RecordId, RecordMeta, NOT_REMOVED};
pub use model::time_order::{
    InvalidTimestamp, InvalidTimestampRange, TimeOrder, TimeOrdered, TimeWindow, MIN_TIMESTAMP,
    TIME_ORDER_COLUMN,
};
pub use query::predicate::{CmpOp, Direction, Predicate, Query};
pub use query::range::{range_predicates, AnchoredRange, AnchoredRangeExt, RangeSelector};
pub use repo::error::{RepoError, RepoResult};
pub use repo::soft_delete::{DeleteMode, Flush, Read, SoftDeleteRepository};
pub use repo::time_index::ReverseTimeIndex;
pub use store::sqlite::SqliteStore;
pub use store::{Entity, RecordCursor, Store};
