//! Command-line front end for the reverse-time range query.
//!
//! # Responsibility
//! - Seed a demo `status_events` table and print what `get_by_range`
//!   selects for a window, most-recent-first.
//! - Keep output deterministic (`key=value` lines) for quick sanity checks.

use clap::Parser;
use log::info;
use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use timeorder_core::{
    init_logging_from, open_db, open_db_in_memory, CoreConfig, Entity, Flush, InvalidTimestamp,
    RecordMeta, RepoError, RepoResult, SoftDeleteRepository, SqliteStore, TimeOrder, TimeOrdered,
};

const STATUS_EVENTS_DDL: &str = "CREATE TABLE IF NOT EXISTS status_events (
    id TEXT PRIMARY KEY NOT NULL,
    removed_at INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 0,
    modified_at INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    time_order INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS status_events_time_order ON status_events (time_order);";

/// Print the status events selected for a time window.
#[derive(Parser)]
#[command(name = "timeorder", version, about, long_about = None)]
struct Cli {
    /// Window start (epoch seconds); the record current at this instant is included.
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,

    /// Window end (epoch seconds), inclusive.
    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,

    /// Timestamps of the events to seed before querying.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "1,10,20",
        allow_negative_numbers = true
    )]
    seed: Vec<i64>,

    /// SQLite file to use instead of an in-memory database.
    #[arg(long)]
    db: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Demo record: a status reported at an instant.
#[derive(Debug, Clone)]
struct StatusEvent {
    meta: RecordMeta,
    status: String,
    time_order: TimeOrder,
}

impl StatusEvent {
    fn at(timestamp: i64) -> Result<Self, InvalidTimestamp> {
        Ok(Self {
            meta: RecordMeta::new(),
            status: format!("status-{timestamp}"),
            time_order: TimeOrder::from_timestamp(timestamp)?,
        })
    }
}

impl Entity for StatusEvent {
    const TABLE: &'static str = "status_events";
    const COLUMNS: &'static [&'static str] = &["status", "time_order"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.status.clone()),
            Value::Integer(self.time_order.sort_key()),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            status: row.get("status")?,
            time_order: TimeOrder::from_sort_key(row.get("time_order")?)
                .map_err(|err| RepoError::InvalidData(format!("status_events.time_order: {err}")))?,
        })
    }
}

impl TimeOrdered for StatusEvent {
    fn time_order(&self) -> TimeOrder {
        self.time_order
    }

    fn time_order_mut(&mut self) -> &mut TimeOrder {
        &mut self.time_order
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    init_logging_from(&config.log)?;

    let conn = match &cli.db {
        Some(path) => open_db(path, &config.store)?,
        None => open_db_in_memory(&config.store)?,
    };
    conn.execute_batch(STATUS_EVENTS_DDL)?;

    let repo = SoftDeleteRepository::with_config(
        SqliteStore::<StatusEvent>::try_new(&conn)?,
        &config.soft_delete,
    );
    seed_events(&repo, &cli.seed)?;

    let events = repo.time_index().get_by_range([], cli.start, cli.end)?;
    info!(
        "event=cli_range module=cli status=ok start={:?} end={:?} returned={}",
        cli.start,
        cli.end,
        events.len()
    );
    for event in &events {
        println!("timestamp={} status={}", event.timestamp(), event.status);
    }
    Ok(())
}

fn seed_events(
    repo: &SoftDeleteRepository<SqliteStore<'_, StatusEvent>>,
    timestamps: &[i64],
) -> Result<(), Box<dyn Error>> {
    repo.begin()?;
    for timestamp in timestamps {
        repo.save(&mut StatusEvent::at(*timestamp)?, Flush::Deferred)?;
    }
    repo.flush()?;
    info!(
        "event=cli_seed module=cli status=ok table={} seeded={}",
        StatusEvent::TABLE,
        timestamps.len()
    );
    Ok(())
}
