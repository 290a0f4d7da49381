//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::record::RecordId;
use crate::model::time_order::{InvalidTimestamp, InvalidTimestampRange};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of a repository, store or range operation.
#[derive(Debug)]
pub enum RepoError {
    /// Window start is later than its end; raised before any store access.
    InvalidTimestampRange(InvalidTimestampRange),
    /// Query bound has no sort key; raised before any store access.
    InvalidTimestamp(InvalidTimestamp),
    /// Addressed record does not exist.
    NotFound(RecordId),
    /// A read that demands one row matched none.
    NoMatchingRecord { table: &'static str },
    /// Store failure, propagated unchanged.
    Persistence(DbError),
    /// Column name is not a plain SQL identifier.
    InvalidColumn(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be decoded into a valid record.
    InvalidData(String),
}

impl RepoError {
    /// True for both cardinality failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NoMatchingRecord { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestampRange(err) => write!(f, "invalid timestamp range: {err}"),
            Self::InvalidTimestamp(err) => write!(f, "invalid timestamp: {err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::NoMatchingRecord { table } => write!(f, "no matching record in `{table}`"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::InvalidColumn(name) => write!(f, "invalid column name `{name}`"),
            Self::MissingRequiredTable(table) => write!(f, "store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimestampRange(err) => Some(err),
            Self::InvalidTimestamp(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::NotFound(_)
            | Self::NoMatchingRecord { .. }
            | Self::InvalidColumn(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<InvalidTimestampRange> for RepoError {
    fn from(value: InvalidTimestampRange) -> Self {
        Self::InvalidTimestampRange(value)
    }
}

impl From<InvalidTimestamp> for RepoError {
    fn from(value: InvalidTimestamp) -> Self {
        Self::InvalidTimestamp(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}
