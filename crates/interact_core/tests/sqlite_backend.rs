mod common;

use common::{open_store, sample_interactions, seed_interactions, signed_in_user};
use interact_core::db::migrations::latest_version;
use interact_core::db::{open_db, DbError};
use interact_core::{Backend, BackendError, Filter, JsonMap, SelectQuery, SqliteBackend, Table};
use serde_json::{json, Value};

fn user_version(conn: &rusqlite::Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn fresh_store_is_migrated_to_latest() {
    let conn = open_store();
    assert_eq!(latest_version(), 2);
    assert_eq!(user_version(&conn), latest_version());
}

#[test]
fn reopening_a_file_store_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        seed_interactions(&SqliteBackend::new(&conn), sample_interactions());
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    let rows = SqliteBackend::new(&conn)
        .select(&SelectQuery::new(Table::FoodDrugInteractions).columns(&["id"]))
        .unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(4));
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");
    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    match open_db(&path) {
        Err(DbError::SchemaTooNew { found, supported }) => {
            assert_eq!(found, 99);
            assert_eq!(supported, latest_version());
        }
        other => panic!("expected SchemaTooNew, got {other:?}"),
    }
}

#[test]
fn unknown_columns_fail_before_touching_the_store() {
    let conn = open_store();
    let backend = SqliteBackend::new(&conn);

    let err = backend
        .select(&SelectQuery::new(Table::Profiles).filter(Filter::eq("email", "x")))
        .unwrap_err();
    assert!(matches!(err, BackendError::UnknownColumn { table: Table::Profiles, .. }));

    let mut row = JsonMap::new();
    row.insert("password".to_string(), json!("secret"));
    let err = backend.insert(Table::Profiles, &[row]).unwrap_err();
    assert!(matches!(err, BackendError::UnknownColumn { .. }));

    let err = backend
        .delete(Table::InteractionHistory, &Filter::eq("nope", 1))
        .unwrap_err();
    assert!(matches!(err, BackendError::UnknownColumn { .. }));
}

#[test]
fn multi_row_insert_is_all_or_nothing() {
    let conn = open_store();
    let backend = SqliteBackend::new(&conn);

    let mut good = JsonMap::new();
    good.insert("drug_name".to_string(), json!("Aspirin"));
    let mut bad = JsonMap::new();
    bad.insert("drug_name".to_string(), json!({ "nested": true }));

    assert!(matches!(
        backend.insert(Table::FoodDrugInteractions, &[good, bad]),
        Err(BackendError::UnsupportedValue(_))
    ));
    let rows = backend
        .select(&SelectQuery::new(Table::FoodDrugInteractions))
        .unwrap();
    assert_eq!(rows, Value::Array(Vec::new()));
}

#[test]
fn empty_in_matches_nothing_and_eq_null_matches_missing_values() {
    let conn = open_store();
    let backend = SqliteBackend::new(&conn);
    seed_interactions(&backend, sample_interactions());

    let removed = backend
        .delete(
            Table::FoodDrugInteractions,
            &Filter::is_in("id", Vec::<i64>::new()),
        )
        .unwrap();
    assert_eq!(removed, 0);

    let without_brand = backend
        .select(
            &SelectQuery::new(Table::FoodDrugInteractions)
                .columns(&["drug_name"])
                .filter(Filter::eq("brand_name", Value::Null))
                .order("drug_name", true)
                .order("food_herb_name", true),
        )
        .unwrap();
    let names = without_brand
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["drug_name"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Levothyroxine", "Simvastatin", "Warfarin"]);
}

#[test]
fn limit_and_projection_shape_the_payload() {
    let conn = open_store();
    let backend = SqliteBackend::new(&conn);
    seed_interactions(&backend, sample_interactions());

    let rows = backend
        .select(
            &SelectQuery::new(Table::FoodDrugInteractions)
                .columns(&["drug_name", "food_herb_name"])
                .order("drug_name", false)
                .limit(1),
        )
        .unwrap();
    let row = &rows.as_array().unwrap()[0];
    assert_eq!(row["drug_name"], json!("Warfarin"));
    assert_eq!(row.as_object().unwrap().len(), 2);
}

#[test]
fn history_insert_leaves_optional_columns_null() {
    let conn = open_store();
    let user = signed_in_user(&conn, "ada@example.com", "ada");
    let backend = SqliteBackend::new(&conn);

    let mut row = JsonMap::new();
    row.insert("user_id".to_string(), json!(user.id.to_string()));
    row.insert("drug1".to_string(), json!("Warfarin"));
    row.insert("drug2".to_string(), json!("Ginkgo"));
    row.insert("created_at".to_string(), json!(1));
    assert_eq!(backend.insert(Table::InteractionHistory, &[row]).unwrap(), 1);

    let rows = backend
        .select(
            &SelectQuery::new(Table::InteractionHistory)
                .filter(Filter::eq("user_id", user.id.to_string())),
        )
        .unwrap();
    assert_eq!(rows[0]["result"], Value::Null);
}
