//! Schema declarations for vertex and edge types
//!
//! Stores register a vertex type with its field set and primary key field,
//! and an edge type with its field set. Writes are checked against the
//! declaration by the store, not by the harness.

use crate::error::{StoreError, StoreResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 64-bit signed integer
    Int64,
    /// 64-bit float; integer writes are widened
    Double,
    /// UTF-8 string
    String,
}

impl FieldType {
    /// Check a value against this type, widening where allowed
    ///
    /// `Null` is accepted here; optionality is checked by [`FieldSpec`].
    pub fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (FieldType::Int64, v @ Value::Int(_)) => Some(v),
            (FieldType::Double, v @ Value::Float(_)) => Some(v),
            (FieldType::Double, Value::Int(i)) => Some(Value::Float(i as f64)),
            (FieldType::String, v @ Value::String(_)) => Some(v),
            _ => None,
        }
    }
}

/// A single field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Whether the field may be left unset
    pub optional: bool,
}

impl FieldSpec {
    /// Declare a field that must be set on creation
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldSpec {
            name: name.into(),
            field_type,
            optional: false,
        }
    }

    /// Declare a field that may be left unset
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldSpec {
            name: name.into(),
            field_type,
            optional: true,
        }
    }

    /// Validate and coerce a value written to this field
    pub fn check(&self, value: Value) -> StoreResult<Value> {
        if value.is_null() && !self.optional {
            return Err(StoreError::schema(format!(
                "field '{}' is required",
                self.name
            )));
        }
        let kind = value.type_name();
        self.field_type.coerce(value).ok_or_else(|| {
            StoreError::schema(format!(
                "field '{}' expects {:?}, got {}",
                self.name, self.field_type, kind
            ))
        })
    }
}
