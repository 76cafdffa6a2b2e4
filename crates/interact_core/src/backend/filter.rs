//! Row filters and select queries understood by every backend.
//!
//! # Responsibility
//! - Model conjunction/disjunction of per-column predicates.
//!
//! # Invariants
//! - `Contains` matches case-insensitively (Unicode lowercase) and treats `%`/`_` in the needle
//!   literally.
//! - An empty `Or`/`In` matches nothing; an empty `And` matches everything.

use super::{BackendError, BackendResult, Table};
use serde_json::Value;

/// Predicate tree applied to rows of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    Eq {
        column: &'static str,
        value: Value,
    },
    /// Case-insensitive substring match (`ilike %needle%`).
    Contains {
        column: &'static str,
        needle: String,
    },
    In {
        column: &'static str,
        values: Vec<Value>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::Eq {
            column,
            value: value.into(),
        }
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self::Contains {
            column,
            needle: needle.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(column: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds `column ilike %needle%` for each column, OR-ed together.
    pub fn contains_any(columns: &[&'static str], needle: &str) -> Self {
        Self::Or(
            columns
                .iter()
                .map(|column| Self::contains(*column, needle))
                .collect(),
        )
    }

    /// Rejects predicates on columns the table does not expose.
    pub fn check_columns(&self, table: Table) -> BackendResult<()> {
        match self {
            Self::All => Ok(()),
            Self::Eq { column, .. } | Self::Contains { column, .. } | Self::In { column, .. } => {
                check_column(table, column)
            }
            Self::And(children) | Self::Or(children) => children
                .iter()
                .try_for_each(|child| child.check_columns(table)),
        }
    }
}

/// Sort key for select queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

/// Filtered, ordered projection over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: Table,
    /// Projected columns; empty selects every known column.
    pub columns: Vec<&'static str>,
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    /// Starts a `select *` over `table` with no filter.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filter: Filter::All,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order(mut self, column: &'static str, ascending: bool) -> Self {
        self.order_by.push(OrderBy { column, ascending });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the projected columns, expanding `select *`.
    pub fn projection(&self) -> &[&'static str] {
        if self.columns.is_empty() {
            self.table.columns()
        } else {
            &self.columns
        }
    }

    /// Validates projection, filter and ordering columns.
    pub fn check_columns(&self) -> BackendResult<()> {
        for column in self.projection() {
            check_column(self.table, column)?;
        }
        for order in &self.order_by {
            check_column(self.table, order.column)?;
        }
        self.filter.check_columns(self.table)
    }
}

fn check_column(table: Table, column: &str) -> BackendResult<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(BackendError::UnknownColumn {
            table,
            column: column.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Filter, SelectQuery};
    use crate::backend::{BackendError, Table};

    #[test]
    fn contains_any_builds_one_predicate_per_column() {
        let filter = Filter::contains_any(&["drug_name", "note"], "tea");
        assert_eq!(
            filter,
            Filter::Or(vec![
                Filter::contains("drug_name", "tea"),
                Filter::contains("note", "tea"),
            ])
        );
    }

    #[test]
    fn in_filter_converts_values() {
        let Filter::In { column, values } = Filter::is_in("id", [4_i64, 5]) else {
            panic!("expected IN filter");
        };
        assert_eq!(column, "id");
        assert_eq!(values, vec![serde_json::json!(4), serde_json::json!(5)]);
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let query = SelectQuery::new(Table::Profiles).filter(Filter::eq("email", "a@b.c"));
        match query.check_columns() {
            Err(BackendError::UnknownColumn { table, column }) => {
                assert_eq!(table, Table::Profiles);
                assert_eq!(column, "email");
            }
            other => panic!("expected unknown column error, got {other:?}"),
        }
    }

    #[test]
    fn empty_projection_expands_to_all_columns() {
        let query = SelectQuery::new(Table::Profiles);
        assert_eq!(query.projection(), &["id", "username"]);
    }
}
