//! Data-access collaborator contracts.
//!
//! # Responsibility
//! - Define the hosted-store surface the services depend on: identity,
//!   filtered select, insert and delete over named tables.
//! - Keep services independent from any concrete store so tests can
//!   substitute a scripted fake.
//!
//! # Invariants
//! - `select` returns the raw JSON payload; callers decode and defend
//!   against unexpected shapes.
//! - Column names are checked against the table's known columns before any
//!   store access.

use crate::db::DbError;
use crate::model::account::UserIdentity;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod filter;
mod password;
pub mod sqlite;

pub use filter::{Filter, OrderBy, SelectQuery};
pub use sqlite::SqliteBackend;

/// One row payload for inserts.
pub type JsonMap = serde_json::Map<String, Value>;

pub type BackendResult<T> = Result<T, BackendError>;

/// Tables exposed by the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Read-only reference data of known interactions.
    FoodDrugInteractions,
    /// Per-user saved lookups.
    InteractionHistory,
    /// `id` ↔ `username` mapping for signed-up users.
    Profiles,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::FoodDrugInteractions => "food_drug_interactions",
            Self::InteractionHistory => "interaction_history",
            Self::Profiles => "profiles",
        }
    }

    /// Columns addressable through filters, projections and inserts.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::FoodDrugInteractions => &[
                "id",
                "drug_name",
                "brand_name",
                "food_herb_name",
                "component",
                "note",
                "result",
                "effect",
                "conclusion",
                "reference",
            ],
            Self::InteractionHistory => &[
                "id",
                "user_id",
                "drug1",
                "drug2",
                "result",
                "description",
                "created_at",
            ],
            Self::Profiles => &["id", "username"],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason an auth call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    EmailTaken,
}

/// Store-level error for every collaborator call.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    UnknownColumn { table: Table, column: String },
    /// Insert payload or filter value cannot be stored.
    UnsupportedValue(String),
    Auth(AuthFailure),
    /// Password hashing failed before anything was stored.
    PasswordHash(String),
    /// Injected or transport-level failure without a finer category.
    Unavailable(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` on table `{table}`")
            }
            Self::UnsupportedValue(message) => write!(f, "unsupported value: {message}"),
            Self::Auth(AuthFailure::InvalidCredentials) => write!(f, "invalid login credentials"),
            Self::Auth(AuthFailure::EmailTaken) => write!(f, "email is already registered"),
            Self::PasswordHash(message) => write!(f, "{message}"),
            Self::Unavailable(message) => write!(f, "backend unavailable: {message}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row access over the hosted store.
pub trait Backend {
    /// Returns the signed-in user, or `None` without a session.
    fn current_user(&self) -> BackendResult<Option<UserIdentity>>;
    /// Runs one filtered, ordered select and returns the raw JSON payload.
    fn select(&self, query: &SelectQuery) -> BackendResult<Value>;
    /// Inserts rows and returns how many were written.
    fn insert(&self, table: Table, rows: &[JsonMap]) -> BackendResult<usize>;
    /// Deletes rows matching `filter` and returns how many were removed.
    fn delete(&self, table: Table, filter: &Filter) -> BackendResult<usize>;
}

/// Email/password session management.
pub trait AuthBackend {
    /// Registers a new user without starting a session.
    fn sign_up(&self, email: &str, password: &str) -> BackendResult<UserIdentity>;
    /// Verifies credentials and makes this user the current session.
    fn sign_in(&self, email: &str, password: &str) -> BackendResult<UserIdentity>;
    /// Ends the current session; a no-op without one.
    fn sign_out(&self) -> BackendResult<()>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn current_user(&self) -> BackendResult<Option<UserIdentity>> {
        (**self).current_user()
    }

    fn select(&self, query: &SelectQuery) -> BackendResult<Value> {
        (**self).select(query)
    }

    fn insert(&self, table: Table, rows: &[JsonMap]) -> BackendResult<usize> {
        (**self).insert(table, rows)
    }

    fn delete(&self, table: Table, filter: &Filter) -> BackendResult<usize> {
        (**self).delete(table, filter)
    }
}

impl<B: AuthBackend + ?Sized> AuthBackend for &B {
    fn sign_up(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        (**self).sign_up(email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        (**self).sign_in(email, password)
    }

    fn sign_out(&self) -> BackendResult<()> {
        (**self).sign_out()
    }
}
