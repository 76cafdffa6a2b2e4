//! Substring search over the interaction table.
//!
//! # Responsibility
//! - Own the fixed list of searchable columns.
//! - Build single-term and paired-term filters.
//! - Decode `select` payloads defensively.
//!
//! # Invariants
//! - A blank term never produces a filter.
//! - Results are ordered by `drug_name`, `food_herb_name`, `id` ascending.
//! - Non-array payloads decode as empty; non-object elements are skipped.

use crate::backend::{Filter, SelectQuery, Table};
use crate::model::interaction::InteractionRecord;
use log::warn;
use serde_json::Value;

/// Text columns matched by every search term.
pub const SEARCH_COLUMNS: [&str; 9] = [
    "drug_name",
    "brand_name",
    "food_herb_name",
    "component",
    "note",
    "result",
    "effect",
    "conclusion",
    "reference",
];

/// Builds the OR-of-substrings filter for one term.
///
/// Returns `None` for blank input.
pub fn term_filter(term: &str) -> Option<Filter> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some(Filter::contains_any(&SEARCH_COLUMNS, term))
}

/// Builds a filter matching rows that mention both terms, each in any column.
pub fn pair_filter(first: &str, second: &str) -> Option<Filter> {
    Some(Filter::And(vec![term_filter(first)?, term_filter(second)?]))
}

/// Wraps a filter into the ordered interaction select.
pub fn interaction_select(filter: Filter) -> SelectQuery {
    SelectQuery::new(Table::FoodDrugInteractions)
        .filter(filter)
        .order("drug_name", true)
        .order("food_herb_name", true)
        .order("id", true)
}

/// Decodes a `select` payload into interaction rows.
///
/// Unexpected shapes are logged and dropped instead of failing the lookup.
pub fn decode_interactions(payload: Value) -> Vec<InteractionRecord> {
    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            warn!(
                "event=interaction_decode module=search status=degraded reason=non_array kind={}",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    let total = rows.len();
    let records = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<InteractionRecord>(row) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    "event=interaction_decode module=search status=degraded reason=bad_row error={err}"
                );
                None
            }
        })
        .collect::<Vec<_>>();

    if records.len() != total {
        warn!(
            "event=interaction_decode module=search status=degraded skipped={}",
            total - records.len()
        );
    }
    records
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_interactions, pair_filter, term_filter, SEARCH_COLUMNS};
    use crate::backend::Filter;
    use serde_json::json;

    #[test]
    fn blank_term_has_no_filter() {
        assert!(term_filter("   ").is_none());
        assert!(pair_filter("grapefruit", "").is_none());
    }

    #[test]
    fn term_filter_covers_every_column() {
        let Some(Filter::Or(children)) = term_filter(" tea ") else {
            panic!("expected OR filter");
        };
        assert_eq!(children.len(), SEARCH_COLUMNS.len());
        assert!(children.iter().all(|child| matches!(
            child,
            Filter::Contains { needle, .. } if needle == "tea"
        )));
    }

    #[test]
    fn decode_degrades_on_null_and_skips_scalars() {
        assert!(decode_interactions(json!(null)).is_empty());

        let records = decode_interactions(json!([
            {"id": 1, "drug_name": "Warfarin"},
            42,
            {"id": 2, "food_herb_name": "Kale"}
        ]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].drug_name.as_deref(), Some("Warfarin"));
    }
}
