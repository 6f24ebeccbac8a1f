use rusqlite::Connection;
use sensorledger_core::db::migrations::{latest_version, schema_version};
use sensorledger_core::db::{open_db, open_db_in_memory, DbError};
use sensorledger_core::{
    ContractError, DataPointService, RecheckOutcome, SqliteStateStore, StateStore,
    StaticIdentity,
};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());

    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'world_state'
            );",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1);
}

#[test]
fn reopening_database_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite3");

    let conn = open_db(&path).unwrap();
    SqliteStateStore::new(&conn).put_state("k", b"v").unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_eq!(
        SqliteStateStore::new(&conn).get_state("k").unwrap(),
        Some(b"v".to_vec())
    );
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sqlite_store_put_overwrites_and_delete_removes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);

    store.put_state("k", b"one").unwrap();
    store.put_state("k", b"two").unwrap();
    assert_eq!(store.get_state("k").unwrap(), Some(b"two".to_vec()));

    store.delete_state("k").unwrap();
    assert_eq!(store.get_state("k").unwrap(), None);
    store.delete_state("k").unwrap();
}

#[test]
fn sqlite_range_scan_orders_bytewise_across_pages() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    for key in ["b", "B", "a", "data10", "data2", "_"] {
        store.put_state(key, key.as_bytes()).unwrap();
    }

    let keys: Vec<String> = store
        .range_scan("", "", 2)
        .map(|entry| entry.unwrap().key)
        .collect();
    assert_eq!(keys, vec!["B", "_", "a", "b", "data10", "data2"]);

    let bounded: Vec<String> = store
        .range_scan("a", "data", 10)
        .map(|entry| entry.unwrap().key)
        .collect();
    assert_eq!(bounded, vec!["a", "b"]);
}

#[test]
fn service_lifecycle_over_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let service = DataPointService::new(SqliteStateStore::new(&conn));
        service.init_ledger().unwrap();
        service.add_data_point("x", 25.0, "Org1").unwrap();
        service.transfer_data_point("x", "Org3").unwrap();
        service.delete_data_point("data3").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let service = DataPointService::new(SqliteStateStore::new(&conn));

    let x = service.get_data_point("x").unwrap();
    assert_eq!(x.owner, "Org3");
    assert!(x.has_alert());
    assert!(matches!(
        service.read_data_point("data3").unwrap_err(),
        ContractError::NotFound(_)
    ));

    let outcome = service
        .consensus_on_threshold_crossed(&StaticIdentity::new("Org2"), "data5")
        .unwrap();
    assert_eq!(outcome, RecheckOutcome::AlertRaised);
    assert_eq!(service.list_data_points().unwrap().len(), 5);
}
