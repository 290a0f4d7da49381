mod common;

use common::{open_readings_db, timestamps, Reading};
use rusqlite::Connection;
use std::sync::Arc;
use timeorder_core::{
    DeleteMode, Flush, ManualClock, Predicate, RepoError, SoftDeleteRepository, SqliteStore,
    TimeOrdered, MIN_TIMESTAMP,
};

fn repo(conn: &Connection) -> SoftDeleteRepository<SqliteStore<'_, Reading>> {
    let store = SqliteStore::try_new(conn).expect("readings table matches the contract");
    SoftDeleteRepository::new(store).with_clock(Arc::new(ManualClock::new(1_000)))
}

fn seed(
    repo: &SoftDeleteRepository<SqliteStore<'_, Reading>>,
    device: &str,
    at: &[i64],
) -> Vec<Reading> {
    at.iter()
        .map(|timestamp| {
            let mut reading = Reading::at(device, *timestamp);
            repo.save(&mut reading, Flush::Now).expect("save reading");
            reading
        })
        .collect()
}

fn device(name: &str) -> [Predicate; 1] {
    [Predicate::eq("device", name.to_string())]
}

#[test]
fn range_includes_anchor_at_or_before_start() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10, 20]);
    let index = repo.time_index();

    let cases: [(Option<i64>, Option<i64>, Vec<i64>); 9] = [
        (Some(1), Some(19), vec![10, 1]),
        (Some(5), Some(20), vec![20, 10, 1]),
        (Some(100), Some(150), vec![20]),
        (None, Some(0), vec![]),
        (None, None, vec![20, 10, 1]),
        (Some(15), None, vec![20, 10]),
        (Some(0), Some(20), vec![20, 10, 1]),
        (Some(10), Some(10), vec![10]),
        (Some(12), Some(12), vec![10]),
    ];
    for (start, end, expected) in cases {
        let readings = index
            .get_by_range(device("boiler"), start, end)
            .expect("range query");
        assert_eq!(
            timestamps(&readings),
            expected,
            "start={start:?} end={end:?}"
        );
    }
}

#[test]
fn range_over_empty_table_is_empty() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    let index = repo.time_index();

    let readings = index
        .get_by_range(device("boiler"), Some(1), Some(5))
        .expect("range query on empty table");
    assert!(readings.is_empty());
}

#[test]
fn inverted_window_fails_before_reading() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    let index = repo.time_index();

    let err = index.get_by_range([], Some(5), Some(1)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidTimestampRange(ref range) if range.start == 5 && range.end == 1
    ));
    assert!(err.to_string().contains("must be <="));

    let err = index.read_time_range([], Some(5), Some(1)).err();
    assert!(matches!(err, Some(RepoError::InvalidTimestampRange(_))));
}

#[test]
fn oldest_representable_timestamp_sorts_last() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[MIN_TIMESTAMP, 5]);
    let index = repo.time_index();

    let readings = index
        .get_by_range(device("boiler"), Some(0), Some(10))
        .expect("range query");
    assert_eq!(timestamps(&readings), vec![5, MIN_TIMESTAMP]);

    let latest = index
        .most_recent(device("boiler"), 1)
        .expect("most recent");
    assert_eq!(timestamps(&latest), vec![5]);

    let window = index
        .read_time_range(device("boiler"), Some(MIN_TIMESTAMP), Some(MIN_TIMESTAMP))
        .expect("point window at the oldest timestamp");
    assert_eq!(
        timestamps(&window.all().expect("read window")),
        vec![MIN_TIMESTAMP]
    );
}

#[test]
fn min_value_bounds_fail_before_reading() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10]);
    let index = repo.time_index();

    let err = index
        .get_by_range(device("boiler"), Some(i64::MIN), Some(10))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidTimestamp(ref bad) if bad.value == i64::MIN));

    let err = index
        .read_time_range(device("boiler"), Some(i64::MIN), None)
        .err();
    assert!(matches!(err, Some(RepoError::InvalidTimestamp(_))));

    let err = index
        .read_time_range(device("boiler"), None, Some(i64::MIN))
        .err();
    assert!(matches!(err, Some(RepoError::InvalidTimestamp(_))));

    let err = index.as_of(device("boiler"), i64::MIN).unwrap_err();
    assert!(matches!(err, RepoError::InvalidTimestamp(_)));
}

#[test]
fn persisted_min_sort_key_is_invalid_data() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    conn.execute(
        "INSERT INTO readings (id, device, label, time_order) \
         VALUES ('6f1c2f6e-1111-4222-8333-944444444444', 'boiler', 'x', -9223372036854775808);",
        [],
    )
    .expect("insert raw row");

    let err = repo
        .time_index()
        .get_by_range(device("boiler"), None, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(ref message) if message.contains("time_order")));
}

#[test]
fn range_respects_extra_filters() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10, 20]);
    seed(&repo, "pump", &[5, 15]);
    let index = repo.time_index();

    let boiler = index
        .get_by_range(device("boiler"), Some(5), Some(20))
        .expect("boiler range");
    assert_eq!(timestamps(&boiler), vec![20, 10, 1]);

    let pump = index
        .get_by_range(device("pump"), Some(12), None)
        .expect("pump range");
    assert_eq!(timestamps(&pump), vec![15, 5]);

    let both = index
        .get_by_range([], Some(12), Some(16))
        .expect("unfiltered range");
    assert_eq!(timestamps(&both), vec![15, 10]);
}

#[test]
fn soft_deleted_rows_never_anchor() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    let mut seeded = seed(&repo, "boiler", &[1, 10, 20]);
    repo.delete(&mut seeded[1], DeleteMode::Soft, Flush::Now)
        .expect("soft delete");
    let index = repo.time_index();

    let readings = index
        .get_by_range(device("boiler"), Some(15), Some(20))
        .expect("range query");
    assert_eq!(timestamps(&readings), vec![20, 1]);
}

#[test]
fn walk_stops_pulling_rows_after_anchor() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10, 20]);
    // Oldest row is undecodable; reaching it would surface InvalidData.
    conn.execute(
        "INSERT INTO readings (id, device, label, time_order) VALUES ('broken', 'boiler', 'x', 0);",
        [],
    )
    .expect("insert raw row");
    let index = repo.time_index();

    let readings = index
        .get_by_range(device("boiler"), Some(5), None)
        .expect("walk ends at the anchor");
    assert_eq!(timestamps(&readings), vec![20, 10, 1]);

    let err = index
        .get_by_range(device("boiler"), None, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn read_time_range_is_a_plain_window() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10, 20]);
    let index = repo.time_index();

    let window = index
        .read_time_range(device("boiler"), Some(5), Some(20))
        .expect("plain window");
    assert_eq!(timestamps(&window.all().expect("read window")), vec![20, 10]);

    let first = window
        .first()
        .expect("read first")
        .map(|reading| reading.timestamp());
    assert_eq!(first, Some(20));

    let open_ended = index
        .read_time_range([], Some(10), None)
        .expect("open-ended window");
    assert_eq!(
        timestamps(&open_ended.all().expect("read window")),
        vec![20, 10]
    );
}

#[test]
fn most_recent_and_as_of() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "boiler", &[1, 10, 20]);
    let index = repo.time_index();

    let latest = index
        .most_recent(device("boiler"), 2)
        .expect("most recent");
    assert_eq!(timestamps(&latest), vec![20, 10]);

    let at_15 = index.as_of(device("boiler"), 15).expect("as of 15");
    assert_eq!(at_15.map(|reading| reading.timestamp()), Some(10));

    let at_10 = index.as_of(device("boiler"), 10).expect("as of 10");
    assert_eq!(at_10.map(|reading| reading.timestamp()), Some(10));

    assert!(index
        .as_of(device("boiler"), 0)
        .expect("as of 0")
        .is_none());
}

#[test]
fn restamped_records_move_in_the_index() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    let mut seeded = seed(&repo, "boiler", &[1, 10, 20]);

    seeded[0].set_timestamp(30).expect("timestamp 30");
    assert_eq!(seeded[0].time_order.sort_key(), -30);
    repo.save(&mut seeded[0], Flush::Now).expect("save restamped");

    assert!(seeded[0].set_timestamp(i64::MIN).is_err());
    assert_eq!(seeded[0].timestamp(), 30);

    let latest = repo
        .time_index()
        .most_recent(device("boiler"), 1)
        .expect("most recent");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].meta.id, seeded[0].meta.id);
    assert_eq!(latest[0].timestamp(), 30);
}

#[test]
fn negative_timestamps_sort_after_positive_ones() {
    let conn = open_readings_db();
    let repo = repo(&conn);
    seed(&repo, "clock", &[-50, -5, 0, 5]);
    let index = repo.time_index();

    let readings = index
        .get_by_range(device("clock"), Some(-10), Some(0))
        .expect("range query");
    assert_eq!(timestamps(&readings), vec![0, -5, -50]);
}
