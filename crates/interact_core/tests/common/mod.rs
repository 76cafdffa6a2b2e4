#![allow(dead_code)]

use interact_core::db::open_db_in_memory;
use interact_core::{
    AccountService, AuthBackend, Backend, BackendError, BackendResult, Filter, JsonMap, SelectQuery,
    SqliteBackend, Table, UserIdentity,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};

pub const PASSWORD: &str = "correct horse";

pub fn open_store() -> Connection {
    open_db_in_memory().expect("in-memory store should open")
}

/// Inserts interaction rows given as JSON objects.
pub fn seed_interactions(backend: &SqliteBackend<'_>, rows: Value) {
    let rows = rows
        .as_array()
        .expect("seed rows must be an array")
        .iter()
        .map(|row| row.as_object().expect("seed row must be an object").clone())
        .collect::<Vec<JsonMap>>();
    backend
        .insert(Table::FoodDrugInteractions, &rows)
        .expect("seed insert should succeed");
}

pub fn sample_interactions() -> Value {
    json!([
        {
            "drug_name": "Warfarin",
            "brand_name": "Coumadin",
            "food_herb_name": "Grapefruit juice",
            "effect": "Increase",
            "conclusion": "Avoid large amounts of grapefruit juice."
        },
        {
            "drug_name": "Warfarin",
            "food_herb_name": "Ginkgo",
            "effect": "Bleeding risk",
            "result": "Raised INR reported",
            "note": "Case reports only"
        },
        {
            "drug_name": "Simvastatin",
            "food_herb_name": "Grapefruit",
            "component": "Furanocoumarins",
            "note": "Inhibits CYP3A4"
        },
        {
            "drug_name": "Levothyroxine",
            "food_herb_name": "Soy",
            "reference": "Thyroid 2005;15:10"
        }
    ])
}

/// Registers `username` and makes it the current session.
pub fn signed_in_user(conn: &Connection, email: &str, username: &str) -> UserIdentity {
    let accounts = AccountService::new(SqliteBackend::new(conn));
    accounts
        .sign_up(email, PASSWORD, username)
        .expect("sign up should succeed");
    accounts
        .sign_in(email, PASSWORD)
        .expect("sign in should succeed")
}

/// Backend wrapper that records calls and injects failures.
pub struct ScriptedBackend<'conn> {
    inner: SqliteBackend<'conn>,
    pub calls: RefCell<Vec<&'static str>>,
    pub no_user: Cell<bool>,
    pub fail_identity: Cell<bool>,
    pub fail_insert: Cell<bool>,
    pub fail_select: Cell<bool>,
    pub fail_delete: Cell<bool>,
    pub null_select: Cell<bool>,
    /// History id appended to every history select, as if a row had been
    /// deleted elsewhere after the fetch.
    pub vanished_history_id: Cell<Option<i64>>,
}

impl<'conn> ScriptedBackend<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteBackend::new(conn),
            calls: RefCell::new(Vec::new()),
            no_user: Cell::new(false),
            fail_identity: Cell::new(false),
            fail_insert: Cell::new(false),
            fail_select: Cell::new(false),
            fail_delete: Cell::new(false),
            null_select: Cell::new(false),
            vanished_history_id: Cell::new(None),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn heal(&self) {
        for flag in [
            &self.no_user,
            &self.fail_identity,
            &self.fail_insert,
            &self.fail_select,
            &self.fail_delete,
            &self.null_select,
        ] {
            flag.set(false);
        }
        self.vanished_history_id.set(None);
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

fn injected(step: &str) -> BackendError {
    BackendError::Unavailable(format!("injected {step} failure"))
}

impl Backend for ScriptedBackend<'_> {
    fn current_user(&self) -> BackendResult<Option<UserIdentity>> {
        self.record("current_user");
        if self.fail_identity.get() {
            return Err(injected("identity"));
        }
        if self.no_user.get() {
            return Ok(None);
        }
        self.inner.current_user()
    }

    fn select(&self, query: &SelectQuery) -> BackendResult<Value> {
        self.record("select");
        if self.fail_select.get() {
            return Err(injected("select"));
        }
        if self.null_select.get() {
            return Ok(Value::Null);
        }
        let mut payload = self.inner.select(query)?;
        if let (Table::InteractionHistory, Some(id), Value::Array(rows)) =
            (query.table, self.vanished_history_id.get(), &mut payload)
        {
            rows.push(json!({ "id": id, "created_at": 0 }));
        }
        Ok(payload)
    }

    fn insert(&self, table: Table, rows: &[JsonMap]) -> BackendResult<usize> {
        self.record("insert");
        if self.fail_insert.get() {
            return Err(injected("insert"));
        }
        self.inner.insert(table, rows)
    }

    fn delete(&self, table: Table, filter: &Filter) -> BackendResult<usize> {
        self.record("delete");
        if self.fail_delete.get() {
            return Err(injected("delete"));
        }
        self.inner.delete(table, filter)
    }
}

impl AuthBackend for ScriptedBackend<'_> {
    fn sign_up(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        self.record("sign_up");
        self.inner.sign_up(email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        self.record("sign_in");
        self.inner.sign_in(email, password)
    }

    fn sign_out(&self) -> BackendResult<()> {
        self.record("sign_out");
        self.inner.sign_out()
    }
}
