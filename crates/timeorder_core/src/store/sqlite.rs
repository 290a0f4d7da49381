//! SQLite implementation of the `Store` contract.
//!
//! # Responsibility
//! - Render `Query` values into parameterized SQL over one entity table.
//! - Decode rows lazily from the statement cursor.
//!
//! # Invariants
//! - Construction fails unless the table and every required column exist.
//! - Interpolated names are validated identifiers; values are always bound.
//! - `update` and `physically_delete` report `NotFound` when no row changed.

use crate::model::record::{
    RecordId, RecordMeta, CREATED_AT_COLUMN, ID_COLUMN, META_COLUMNS, MODIFIED_AT_COLUMN,
    REMOVED_AT_COLUMN,
};
use crate::query::predicate::{is_valid_identifier, Query};
use crate::repo::error::{RepoError, RepoResult};
use crate::store::{Entity, RecordCursor, Store};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::marker::PhantomData;
use uuid::Uuid;

/// Store over one entity table on a borrowed connection.
pub struct SqliteStore<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteStore<'conn, E> {
    /// Binds the store to `conn` after checking the entity's table contract.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready::<E>(conn)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    fn encode(&self, record: &E) -> RepoResult<Vec<Value>> {
        let meta = record.meta();
        let mut values = vec![
            Value::Text(meta.id.to_string()),
            Value::Integer(meta.removed_at),
            Value::Integer(meta.created_at),
            Value::Integer(meta.modified_at),
        ];
        let owned = record.values();
        if owned.len() != E::COLUMNS.len() {
            return Err(RepoError::InvalidData(format!(
                "{} produced {} values for {} columns",
                E::TABLE,
                owned.len(),
                E::COLUMNS.len()
            )));
        }
        values.extend(owned);
        Ok(values)
    }
}

impl<E: Entity> Store for SqliteStore<'_, E> {
    type Record = E;

    fn insert_or_update(&self, record: &E) -> RepoResult<()> {
        let values = self.encode(record)?;
        let columns = all_columns::<E>();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = columns
            .iter()
            .filter(|column| **column != ID_COLUMN)
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "INSERT INTO {table} ({columns}) VALUES ({placeholders})
             ON CONFLICT({ID_COLUMN}) DO UPDATE SET {assignments};",
            table = E::TABLE,
            columns = columns.join(", "),
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn update(&self, record: &E) -> RepoResult<()> {
        let mut values = self.encode(record)?;
        let id = values.remove(0);
        let columns = all_columns::<E>();
        let assignments = columns
            .iter()
            .skip(1)
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        values.push(id);

        let sql = format!(
            "UPDATE {table} SET {assignments} WHERE {ID_COLUMN} = ?{id_index};",
            table = E::TABLE,
            id_index = values.len(),
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.meta().id));
        }
        Ok(())
    }

    fn scan<T, F>(&self, query: &Query, visit: F) -> RepoResult<T>
    where
        F: FnOnce(&mut RecordCursor<'_, E>) -> RepoResult<T>,
    {
        let (sql, binds) = render_select::<E>(query)?;
        debug!(
            "event=store_scan module=store status=start table={} predicates={}",
            E::TABLE,
            query.predicates().len()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut cursor = std::iter::from_fn(|| match rows.next() {
            Ok(Some(row)) => Some(decode_record::<E>(row)),
            Ok(None) => None,
            Err(err) => Some(Err(err.into())),
        });
        visit(&mut cursor)
    }

    fn physically_delete(&self, id: RecordId) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1;", E::TABLE);
        let changed = self.conn.execute(&sql, [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn begin(&self) -> RepoResult<()> {
        self.conn.execute_batch("BEGIN DEFERRED;")?;
        Ok(())
    }

    fn flush(&self) -> RepoResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT;")?;
        }
        Ok(())
    }
}

fn all_columns<E: Entity>() -> Vec<&'static str> {
    META_COLUMNS
        .iter()
        .chain(E::COLUMNS.iter())
        .copied()
        .collect()
}

fn ensure_identifier(name: &str) -> RepoResult<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(RepoError::InvalidColumn(name.to_string()))
    }
}

fn render_select<E: Entity>(query: &Query) -> RepoResult<(String, Vec<Value>)> {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE 1 = 1",
        all_columns::<E>().join(", "),
        E::TABLE
    );
    let mut binds: Vec<Value> = Vec::with_capacity(query.predicates().len() + 1);

    for predicate in query.predicates() {
        ensure_identifier(predicate.column())?;
        sql.push_str(&format!(
            " AND {} {} ?",
            predicate.column(),
            predicate.op().as_sql()
        ));
        binds.push(predicate.value().clone());
    }

    if let Some(order) = query.ordering() {
        ensure_identifier(order.column)?;
        sql.push_str(&format!(
            " ORDER BY {} {}",
            order.column,
            order.direction.as_sql()
        ));
    }

    if let Some(limit) = query.row_limit() {
        sql.push_str(" LIMIT ?");
        binds.push(Value::Integer(i64::from(limit)));
    }

    Ok((sql, binds))
}

fn decode_record<E: Entity>(row: &Row<'_>) -> RepoResult<E> {
    let id_text: String = row.get(ID_COLUMN)?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{id_text}` in {}.{ID_COLUMN}",
            E::TABLE
        ))
    })?;

    let removed_at: i64 = row.get(REMOVED_AT_COLUMN)?;
    if removed_at < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative {REMOVED_AT_COLUMN} `{removed_at}` in {}",
            E::TABLE
        )));
    }

    let meta = RecordMeta {
        id,
        removed_at,
        created_at: row.get(CREATED_AT_COLUMN)?,
        modified_at: row.get(MODIFIED_AT_COLUMN)?,
    };
    E::from_row(meta, row)
}

fn ensure_table_ready<E: Entity>(conn: &Connection) -> RepoResult<()> {
    ensure_identifier(E::TABLE)?;
    for column in E::COLUMNS {
        ensure_identifier(column)?;
    }

    if !table_exists(conn, E::TABLE)? {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    let present = table_columns(conn, E::TABLE)?;
    for column in all_columns::<E>() {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
