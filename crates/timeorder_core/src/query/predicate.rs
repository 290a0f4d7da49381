//! Conjunctive predicates and ordering over named columns.
//!
//! # Responsibility
//! - Describe store reads as data: `column op value` terms joined by AND,
//!   an optional single-column ordering and an optional row limit.
//!
//! # Invariants
//! - Column names are validated as plain SQL identifiers before rendering.
//! - Values never appear in rendered SQL; they are bound parameters.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Returns whether `name` can be interpolated as a column or table name.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Comparison operator of one predicate term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Le,
    Ge,
}

impl CmpOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

/// One `column op value` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: &'static str,
    op: CmpOp,
    value: Value,
}

impl Predicate {
    pub fn new(column: &'static str, op: CmpOp, value: impl Into<Value>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::new(column, CmpOp::Eq, value)
    }

    pub fn le(column: &'static str, value: impl Into<Value>) -> Self {
        Self::new(column, CmpOp::Le, value)
    }

    pub fn ge(column: &'static str, value: impl Into<Value>) -> Self {
        Self::new(column, CmpOp::Ge, value)
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

/// A store read: predicates joined by AND, optional order and limit.
///
/// An empty predicate list matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: Vec<Predicate>,
    order_by: Option<OrderBy>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    /// Puts `predicate` ahead of the existing terms.
    pub fn prefilter(mut self, predicate: Predicate) -> Self {
        self.predicates.insert(0, predicate);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn ordering(&self) -> Option<OrderBy> {
        self.order_by
    }

    pub fn row_limit(&self) -> Option<u32> {
        self.limit
    }
}
