//! Integration tests for TableStore open, commit and reload
//!
//! These tests verify the complete persistence flow:
//! - Creating new databases
//! - Reopening committed databases on the same medium
//! - Falling back to a fresh database on malformed blobs
//! - Directory-backed and MessagePack-encoded storage
//! - Dropping a database

use std::sync::Arc;
use tablestore_engine::{
    DirectoryMedium, KeyValueMedium, MemoryMedium, Query, Row, SortKey, StoreConfig, StoreError,
    TableStore, Value,
};
use tablestore_storage::testing::FaultyMedium;
use tempfile::TempDir;

fn seed(store: &mut TableStore) {
    store.create_table("notes", ["title", "body"]).unwrap();
    store
        .insert("notes", &Row::new().with("title", "first").with("body", "hello"))
        .unwrap();
    store
        .insert("notes", &Row::new().with("title", "second"))
        .unwrap();
}

#[test]
fn test_committed_state_survives_reopen() {
    let medium = MemoryMedium::new();

    // Phase 1: create and commit
    {
        let mut store = TableStore::open("journal", medium.clone()).unwrap();
        assert!(store.is_new());
        seed(&mut store);
        assert!(store.commit());
    }

    // Phase 2: reopen and keep going
    let mut store = TableStore::open("journal", medium.clone()).unwrap();
    assert!(!store.is_new());
    assert_eq!(store.table_fields("notes").unwrap(), ["ID", "title", "body"]);
    assert_eq!(store.get_ids("notes").unwrap(), vec![1, 2]);

    // Counter was persisted too
    let id = store.insert("notes", &Row::new().with("title", "third")).unwrap();
    assert_eq!(id, 3);
}

#[test]
fn test_uncommitted_changes_are_not_persisted() {
    let medium = MemoryMedium::new();
    {
        let mut store = TableStore::open("journal", medium.clone()).unwrap();
        seed(&mut store);
        assert!(store.commit());
        store.insert("notes", &Row::new().with("title", "lost")).unwrap();
    }

    let store = TableStore::open("journal", medium).unwrap();
    assert_eq!(store.row_count("notes").unwrap(), 2);
}

#[test]
fn test_databases_on_one_medium_are_independent() {
    let medium = MemoryMedium::new();
    let mut a = TableStore::open("alpha", medium.clone()).unwrap();
    let mut b = TableStore::open("beta", medium.clone()).unwrap();

    a.create_table("t", ["x"]).unwrap();
    b.create_table("u", ["y"]).unwrap();
    assert!(a.commit());
    assert!(b.commit());

    let mut keys = medium.keys();
    keys.sort();
    assert_eq!(keys, ["db_alpha", "db_beta"]);

    let a = TableStore::open("alpha", medium.clone()).unwrap();
    assert!(a.table_exists("t").unwrap());
    assert!(!a.table_exists("u").unwrap());
}

#[test]
fn test_malformed_blob_gives_fresh_database() {
    let medium = MemoryMedium::new();
    medium.write("db_broken", b"{\"tables\": [1, 2").unwrap();

    let store = TableStore::open("broken", medium.clone()).unwrap();
    assert!(store.is_new());
    assert_eq!(store.table_count().unwrap(), 0);
}

#[test]
fn test_inconsistent_blob_gives_fresh_database() {
    let medium = MemoryMedium::new();
    // Row stored under key 1 claims ID 7
    medium
        .write(
            "db_odd",
            br#"{"tables":{"t":{"fields":["ID","x"],"auto_increment":8}},
                 "data":{"t":{"1":{"ID":7,"x":1}}}}"#,
        )
        .unwrap();

    let store = TableStore::open("odd", medium).unwrap();
    assert!(store.is_new());
    assert!(!store.table_exists("t").unwrap());
}

#[test]
fn test_counter_beyond_int_range_gives_fresh_database() {
    let medium = MemoryMedium::new();
    medium
        .write(
            "db_spent",
            br#"{"tables":{"t":{"fields":["ID"],"auto_increment":18446744073709551615}},"data":{"t":{}}}"#,
        )
        .unwrap();

    let mut store = TableStore::open("spent", medium).unwrap();
    assert!(store.is_new());
    assert!(!store.table_exists("t").unwrap());
    store.create_table("t", ["x"]).unwrap();
    assert_eq!(store.insert("t", &Row::new()).unwrap(), 1);
}

#[test]
fn test_counter_at_int_max_refuses_insert() {
    let medium = MemoryMedium::new();
    medium
        .write(
            "db_full",
            br#"{"tables":{"t":{"fields":["ID","x"],"auto_increment":9223372036854775807}},"data":{"t":{}}}"#,
        )
        .unwrap();

    let mut store = TableStore::open("full", medium).unwrap();
    assert!(!store.is_new());
    let err = store.insert("t", &Row::new().with("x", 1)).unwrap_err();
    assert!(matches!(err, StoreError::IdsExhausted(ref t) if t == "t"));
    assert_eq!(store.row_count("t").unwrap(), 0);
}

#[test]
fn test_hand_written_blob_loads() {
    let medium = MemoryMedium::new();
    medium
        .write(
            "db_legacy",
            br#"{"tables":{"people":{"fields":["ID","name","age"],"auto_increment":3}},
                 "data":{"people":{"1":{"ID":1,"name":"Ana","age":30},
                                   "2":{"ID":2,"name":"Bo","age":25.5}}}}"#,
        )
        .unwrap();

    let store = TableStore::open("legacy", medium).unwrap();
    assert!(!store.is_new());
    let rows = store
        .query("people", Query::all(), None, None, &[SortKey::asc("age")], &[])
        .unwrap();
    assert_eq!(rows[0].get("age"), Some(&Value::Float(25.5)));
    assert_eq!(rows[1].get("name"), Some(&Value::from("Ana")));
}

#[test]
fn test_failed_commit_leaves_previous_blob_loadable() {
    let medium = Arc::new(FaultyMedium::new(MemoryMedium::new()));
    let mut store = TableStore::open("app", medium.clone()).unwrap();
    seed(&mut store);
    assert!(store.commit());

    store.insert("notes", &Row::new().with("title", "unsaved")).unwrap();
    medium.fail_writes(true);
    assert!(!store.commit());
    assert_eq!(store.row_count("notes").unwrap(), 3);
    assert_eq!(medium.write_attempts(), 2);

    medium.fail_writes(false);
    let reopened = TableStore::open("app", medium.clone()).unwrap();
    assert_eq!(reopened.row_count("notes").unwrap(), 2);
}

#[test]
fn test_quota_exceeded_commit_returns_false() {
    let medium = MemoryMedium::with_quota(64);
    let mut store = TableStore::open("small", medium.clone()).unwrap();
    store.create_table("blobs", ["data"]).unwrap();
    store
        .insert("blobs", &Row::new().with("data", "x".repeat(200)))
        .unwrap();

    assert!(!store.commit());
    assert!(matches!(
        store.try_commit(),
        Err(StoreError::Persistence(_))
    ));
    assert_eq!(store.row_count("blobs").unwrap(), 1);
    assert!(medium.read("db_small").unwrap().is_none());
}

#[test]
fn test_directory_medium_round_trip() {
    let temp_dir = TempDir::new().unwrap();

    {
        let medium = DirectoryMedium::open(temp_dir.path()).unwrap();
        let mut store = TableStore::open("disk", medium).unwrap();
        seed(&mut store);
        assert!(store.commit());
    }

    assert!(temp_dir.path().join("db_disk.db").exists());

    let medium = DirectoryMedium::open(temp_dir.path()).unwrap();
    let store = TableStore::open("disk", medium).unwrap();
    assert!(!store.is_new());
    assert_eq!(store.row_count("notes").unwrap(), 2);
}

#[test]
fn test_msgpack_config_round_trip() {
    let medium = MemoryMedium::new();
    let config = StoreConfig::from_toml_str("codec = \"msgpack\"\nprefix = \"mp_\"").unwrap();

    {
        let mut store = TableStore::open_with_config("packed", medium.clone(), &config).unwrap();
        seed(&mut store);
        assert!(store.commit());
    }

    let bytes = medium.read("mp_packed").unwrap().unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());

    let store = TableStore::open_with_config("packed", medium.clone(), &config).unwrap();
    assert_eq!(store.row_count("notes").unwrap(), 2);

    // The same blob read with the JSON codec is malformed, not fatal
    let json_store =
        TableStore::open_with_config("packed", medium, &StoreConfig {
            codec: "json".into(),
            ..config
        })
        .unwrap();
    assert!(json_store.is_new());
}

#[test]
fn test_drop_database_removes_key() {
    let medium = MemoryMedium::new();
    let mut store = TableStore::open("gone", medium.clone()).unwrap();
    seed(&mut store);
    assert!(store.commit());

    store.drop_database().unwrap();
    assert!(medium.is_empty());
    assert!(matches!(
        store.query("notes", Query::all(), None, None, &[], &[]),
        Err(StoreError::StoreDropped)
    ));
    assert!(matches!(store.serialize(), Err(StoreError::StoreDropped)));

    let fresh = TableStore::open("gone", medium).unwrap();
    assert!(fresh.is_new());
}
