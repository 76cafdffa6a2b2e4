//! SQLite implementation of the hosted-store contracts.
//!
//! # Responsibility
//! - Serve `select`/`insert`/`delete` over the migrated schema.
//! - Keep a single persisted auth session so separate connections observe
//!   the same signed-in user.
//!
//! # Invariants
//! - All values are bound as parameters; only validated column names are
//!   interpolated into SQL.
//! - `Contains` renders as `casefold(column) LIKE ? ESCAPE '\'` over the
//!   lowercased, wildcard-escaped needle; connections must come from
//!   [`crate::db::open_db`] so `casefold` is registered.
//! - Multi-row inserts are all-or-nothing.

use super::filter::{Filter, SelectQuery};
use super::password::{hash_password, verify_password};
use super::{AuthBackend, AuthFailure, Backend, BackendError, BackendResult, JsonMap, Table};
use crate::clock::now_epoch_ms;
use crate::db::functions::CASEFOLD_FN;
use crate::model::account::UserIdentity;
use log::{debug, warn};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Hosted-store stand-in backed by one SQLite connection.
pub struct SqliteBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBackend<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn identity_by_id(&self, user_id: &str) -> BackendResult<Option<UserIdentity>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, email FROM auth_users WHERE id = ?1;",
                [user_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, email)| parse_identity(&id, email)).transpose()
    }
}

impl Backend for SqliteBackend<'_> {
    fn current_user(&self) -> BackendResult<Option<UserIdentity>> {
        let user_id: Option<String> = self
            .conn
            .query_row("SELECT user_id FROM auth_session WHERE slot = 1;", [], |row| {
                row.get(0)
            })
            .optional()?;

        match user_id {
            Some(user_id) => self.identity_by_id(&user_id),
            None => Ok(None),
        }
    }

    fn select(&self, query: &SelectQuery) -> BackendResult<Value> {
        query.check_columns()?;

        let projection = query.projection();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE ",
            projection.join(", "),
            query.table.name()
        );
        let mut binds = Vec::new();
        push_filter_sql(&query.filter, &mut sql, &mut binds)?;

        if !query.order_by.is_empty() {
            let order = query
                .order_by
                .iter()
                .map(|order| {
                    format!(
                        "{} {}",
                        order.column,
                        if order.ascending { "ASC" } else { "DESC" }
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            binds.push(SqlValue::Integer(i64::from(limit)));
        }

        debug!(
            "event=backend_select module=backend table={} filter={}",
            query.table,
            redacted_shape(&query.filter)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            let mut object = JsonMap::new();
            for (index, column) in projection.iter().enumerate() {
                object.insert((*column).to_string(), json_from_sql(row.get_ref(index)?));
            }
            out.push(Value::Object(object));
        }

        Ok(Value::Array(out))
    }

    fn insert(&self, table: Table, rows: &[JsonMap]) -> BackendResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            let mut columns = Vec::with_capacity(row.len());
            let mut binds = Vec::with_capacity(row.len());
            for (column, value) in row {
                if !table.has_column(column) {
                    return Err(BackendError::UnknownColumn {
                        table,
                        column: column.clone(),
                    });
                }
                columns.push(column.as_str());
                binds.push(sql_from_json(value)?);
            }

            let placeholders = vec!["?"; columns.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                table.name(),
                columns.join(", ")
            );
            tx.execute(&sql, params_from_iter(binds))?;
        }
        tx.commit()?;

        Ok(rows.len())
    }

    fn delete(&self, table: Table, filter: &Filter) -> BackendResult<usize> {
        filter.check_columns(table)?;

        let mut sql = format!("DELETE FROM {} WHERE ", table.name());
        let mut binds = Vec::new();
        push_filter_sql(filter, &mut sql, &mut binds)?;

        let removed = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(removed)
    }
}

impl AuthBackend for SqliteBackend<'_> {
    fn sign_up(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        let email = email.trim().to_ascii_lowercase();
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM auth_users WHERE email = ?1;",
                [email.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(BackendError::Auth(AuthFailure::EmailTaken));
        }

        let id = Uuid::new_v4();
        let password_hash = hash_password(password)?;
        self.conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), email.as_str(), password_hash, now_epoch_ms()],
        )?;

        Ok(UserIdentity { id, email })
    }

    fn sign_in(&self, email: &str, password: &str) -> BackendResult<UserIdentity> {
        let email = email.trim().to_ascii_lowercase();
        let stored = self
            .conn
            .query_row(
                "SELECT id, password_hash FROM auth_users WHERE email = ?1;",
                [email.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id, hash)) = stored else {
            return Err(BackendError::Auth(AuthFailure::InvalidCredentials));
        };
        if !verify_password(password, &hash) {
            warn!("event=auth_sign_in module=backend status=error error_code=invalid_credentials");
            return Err(BackendError::Auth(AuthFailure::InvalidCredentials));
        }

        self.conn.execute(
            "INSERT INTO auth_session (slot, user_id, signed_in_at) VALUES (1, ?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET
                user_id = excluded.user_id,
                signed_in_at = excluded.signed_in_at;",
            params![id.as_str(), now_epoch_ms()],
        )?;

        parse_identity(&id, email)
    }

    fn sign_out(&self) -> BackendResult<()> {
        self.conn
            .execute("DELETE FROM auth_session WHERE slot = 1;", [])?;
        Ok(())
    }
}

fn push_filter_sql(filter: &Filter, sql: &mut String, binds: &mut Vec<SqlValue>) -> BackendResult<()> {
    match filter {
        Filter::All => sql.push_str("1 = 1"),
        Filter::Eq { column, value } => {
            if value.is_null() {
                sql.push_str(&format!("{column} IS NULL"));
            } else {
                sql.push_str(&format!("{column} = ?"));
                binds.push(sql_from_json(value)?);
            }
        }
        Filter::Contains { column, needle } => {
            sql.push_str(&format!("{CASEFOLD_FN}({column}) LIKE ? ESCAPE '\\'"));
            binds.push(SqlValue::Text(format!(
                "%{}%",
                escape_like(&needle.to_lowercase())
            )));
        }
        Filter::In { column, values } => {
            if values.is_empty() {
                sql.push_str("0 = 1");
            } else {
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{column} IN ({placeholders})"));
                for value in values {
                    binds.push(sql_from_json(value)?);
                }
            }
        }
        Filter::And(children) => push_group_sql(children, " AND ", "1 = 1", sql, binds)?,
        Filter::Or(children) => push_group_sql(children, " OR ", "0 = 1", sql, binds)?,
    }
    Ok(())
}

fn push_group_sql(
    children: &[Filter],
    joiner: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<SqlValue>,
) -> BackendResult<()> {
    if children.is_empty() {
        sql.push_str(empty);
        return Ok(());
    }

    sql.push('(');
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            sql.push_str(joiner);
        }
        push_filter_sql(child, sql, binds)?;
    }
    sql.push(')');
    Ok(())
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn sql_from_json(value: &Value) -> BackendResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(SqlValue::Integer(integer))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(BackendError::UnsupportedValue(number.to_string()))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(BackendError::UnsupportedValue(
            "nested arrays and objects cannot be stored in a column".to_string(),
        )),
    }
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::Number(Number::from(integer)),
        ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Filter summary safe for logs: columns and operators, never user text.
fn redacted_shape(filter: &Filter) -> String {
    match filter {
        Filter::All => "all".to_string(),
        Filter::Eq { column, .. } => format!("{column}.eq"),
        Filter::Contains { column, needle } => format!("{column}.ilike(len={})", needle.len()),
        Filter::In { column, values } => format!("{column}.in(n={})", values.len()),
        Filter::And(children) => format!(
            "and({})",
            children.iter().map(redacted_shape).collect::<Vec<_>>().join(",")
        ),
        Filter::Or(children) => format!(
            "or({})",
            children.iter().map(redacted_shape).collect::<Vec<_>>().join(",")
        ),
    }
}

fn parse_identity(id: &str, email: String) -> BackendResult<UserIdentity> {
    let id = Uuid::parse_str(id).map_err(|_| {
        BackendError::UnsupportedValue(format!("invalid user id `{id}` in auth_users.id"))
    })?;
    Ok(UserIdentity { id, email })
}

#[cfg(test)]
mod tests {
    use super::{escape_like, redacted_shape};
    use crate::backend::Filter;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn redacted_shape_hides_needles() {
        let filter = Filter::contains_any(&["note"], "secret");
        let shape = redacted_shape(&filter);
        assert_eq!(shape, "or(note.ilike(len=6))");
        assert!(!shape.contains("secret"));
    }
}
