//! Scalar SQL functions registered on every store connection.
//!
//! # Invariants
//! - `casefold(x)` lowercases text with Unicode rules, so `LIKE` over folded
//!   operands is case-insensitive beyond ASCII.
//! - `casefold(NULL)` is `NULL`; numbers fold to their text form.

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Name of the Unicode lowercase function used by substring filters.
pub(crate) const CASEFOLD_FN: &str = "casefold";

pub(crate) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        casefold,
    )
}

fn casefold(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    Ok(match ctx.get_raw(0) {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_lowercase()),
        ValueRef::Integer(integer) => Some(integer.to_string()),
        ValueRef::Real(real) => Some(real.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}
