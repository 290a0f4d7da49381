#![allow(dead_code)]

use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use timeorder_core::{
    open_db_in_memory, Entity, RecordMeta, RepoError, RepoResult, StoreConfig, TimeOrder,
    TimeOrdered,
};

pub const READINGS_DDL: &str = "CREATE TABLE readings (
    id TEXT PRIMARY KEY NOT NULL,
    removed_at INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 0,
    modified_at INTEGER NOT NULL DEFAULT 0,
    device TEXT NOT NULL,
    label TEXT NOT NULL,
    time_order INTEGER NOT NULL
);
CREATE INDEX readings_time_order ON readings (device, time_order);";

/// Sensor reading keyed by the time it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub meta: RecordMeta,
    pub device: String,
    pub label: String,
    pub time_order: TimeOrder,
}

impl Reading {
    pub fn at(device: &str, timestamp: i64) -> Self {
        Self {
            meta: RecordMeta::new(),
            device: device.to_string(),
            label: format!("{device}@{timestamp}"),
            time_order: TimeOrder::from_timestamp(timestamp).expect("timestamp above i64::MIN"),
        }
    }
}

impl Entity for Reading {
    const TABLE: &'static str = "readings";
    const COLUMNS: &'static [&'static str] = &["device", "label", "time_order"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.device.clone()),
            Value::Text(self.label.clone()),
            Value::Integer(self.time_order.sort_key()),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let device: String = row.get("device")?;
        if device.is_empty() {
            return Err(RepoError::InvalidData("empty readings.device".to_string()));
        }
        Ok(Self {
            meta,
            device,
            label: row.get("label")?,
            time_order: TimeOrder::from_sort_key(row.get("time_order")?)
                .map_err(|err| RepoError::InvalidData(format!("readings.time_order: {err}")))?,
        })
    }
}

impl TimeOrdered for Reading {
    fn time_order(&self) -> TimeOrder {
        self.time_order
    }

    fn time_order_mut(&mut self) -> &mut TimeOrder {
        &mut self.time_order
    }
}

pub fn open_readings_db() -> Connection {
    let conn = open_db_in_memory(&StoreConfig::default()).expect("open in-memory db");
    conn.execute_batch(READINGS_DDL).expect("create readings table");
    conn
}

pub fn timestamps(readings: &[Reading]) -> Vec<i64> {
    readings.iter().map(TimeOrdered::timestamp).collect()
}
