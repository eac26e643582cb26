//! Semicolon-joined log fields
//!
//! `transHistory` and `versionHistory` are append-only logs stored as a
//! single string field: `"100"`, `"50;150"`. An unset field is an empty log.

use isocheck_core::{EdgeCursor, StoreResult, Value, VertexCursor, WriteTxn};

/// Item separator
pub const SEPARATOR: char = ';';

/// Log value after appending `item`
pub fn appended(current: &Value, item: &str) -> String {
    match current.as_str() {
        Some(log) => format!("{}{}{}", log, SEPARATOR, item),
        None => item.to_string(),
    }
}

/// Number of items in a log value
pub fn count_items(value: &Value) -> u64 {
    match value.as_str() {
        Some(log) => 1 + log.matches(SEPARATOR).count() as u64,
        None => 0,
    }
}

/// Items of a log value, oldest first
pub fn items(value: &Value) -> Vec<&str> {
    match value.as_str() {
        Some(log) => log.split(SEPARATOR).collect(),
        None => Vec::new(),
    }
}

/// Append `item` to a log field of the cursor's current vertex
pub fn append_vertex<T: WriteTxn>(
    cursor: &VertexCursor<'_, T>,
    field: &str,
    item: &str,
) -> StoreResult<()> {
    let log = appended(&cursor.field(field)?, item);
    cursor.set_field(field, Value::String(log))
}

/// Append `item` to a log field of the cursor's current edge
pub fn append_edge<T: WriteTxn>(
    cursor: &EdgeCursor<'_, T>,
    field: &str,
    item: &str,
) -> StoreResult<()> {
    let log = appended(&cursor.field(field)?, item);
    cursor.set_field(field, Value::String(log))
}
