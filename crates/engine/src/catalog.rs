//! Schema catalog: declared vertex and edge types

use isocheck_core::{FieldSpec, StoreError, StoreResult, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A declared vertex type
#[derive(Debug, Clone)]
pub struct VertexType {
    /// Declared fields
    pub fields: Vec<FieldSpec>,
    /// Name of the unique business-key field
    pub primary_key: String,
}

/// A declared edge type
#[derive(Debug, Clone)]
pub struct EdgeType {
    /// Declared fields
    pub fields: Vec<FieldSpec>,
}

/// Vertex and edge type declarations
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    vertex_types: HashMap<String, VertexType>,
    edge_types: HashMap<String, EdgeType>,
}

fn check_declaration(name: &str, fields: &[FieldSpec]) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::schema("type name must not be empty"));
    }
    let mut seen = HashSet::new();
    for spec in fields {
        if !seen.insert(spec.name.as_str()) {
            return Err(StoreError::schema(format!(
                "field '{}' declared twice on '{}'",
                spec.name, name
            )));
        }
    }
    Ok(())
}

fn find_spec<'a>(fields: &'a [FieldSpec], label: &str, name: &str) -> StoreResult<&'a FieldSpec> {
    fields
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| StoreError::schema(format!("'{}' has no field '{}'", label, name)))
}

/// Check a full field list for a new record
fn check_record(
    fields: &[FieldSpec],
    label: &str,
    values: &[(&str, Value)],
) -> StoreResult<BTreeMap<String, Value>> {
    let mut record = BTreeMap::new();
    for (name, value) in values {
        let spec = find_spec(fields, label, name)?;
        let value = spec.check(value.clone())?;
        if !value.is_null() {
            record.insert(spec.name.clone(), value);
        }
    }
    if let Some(missing) = fields
        .iter()
        .find(|spec| !spec.optional && !record.contains_key(&spec.name))
    {
        return Err(StoreError::schema(format!(
            "'{}' requires field '{}'",
            label, missing.name
        )));
    }
    Ok(record)
}

impl Catalog {
    /// Declare a vertex type
    ///
    /// The primary key must be one of the declared, required fields.
    pub fn define_vertex_type(
        &mut self,
        name: &str,
        fields: &[FieldSpec],
        primary_key: &str,
    ) -> StoreResult<()> {
        check_declaration(name, fields)?;
        if self.vertex_types.contains_key(name) || self.edge_types.contains_key(name) {
            return Err(StoreError::schema(format!("type '{}' already defined", name)));
        }
        let pk = find_spec(fields, name, primary_key)?;
        if pk.optional {
            return Err(StoreError::schema(format!(
                "primary key '{}' of '{}' must be required",
                primary_key, name
            )));
        }
        self.vertex_types.insert(
            name.to_string(),
            VertexType {
                fields: fields.to_vec(),
                primary_key: primary_key.to_string(),
            },
        );
        Ok(())
    }

    /// Declare an edge type
    pub fn define_edge_type(&mut self, name: &str, fields: &[FieldSpec]) -> StoreResult<()> {
        check_declaration(name, fields)?;
        if self.vertex_types.contains_key(name) || self.edge_types.contains_key(name) {
            return Err(StoreError::schema(format!("type '{}' already defined", name)));
        }
        self.edge_types.insert(
            name.to_string(),
            EdgeType {
                fields: fields.to_vec(),
            },
        );
        Ok(())
    }

    /// Primary key field of a vertex type
    pub fn primary_key(&self, label: &str) -> Option<&str> {
        self.vertex_types
            .get(label)
            .map(|t| t.primary_key.as_str())
    }

    fn vertex_type(&self, label: &str) -> StoreResult<&VertexType> {
        self.vertex_types
            .get(label)
            .ok_or_else(|| StoreError::schema(format!("unknown vertex type '{}'", label)))
    }

    fn edge_type(&self, label: &str) -> StoreResult<&EdgeType> {
        self.edge_types
            .get(label)
            .ok_or_else(|| StoreError::schema(format!("unknown edge type '{}'", label)))
    }

    /// Check and coerce the fields of a new vertex
    pub fn check_vertex(
        &self,
        label: &str,
        values: &[(&str, Value)],
    ) -> StoreResult<BTreeMap<String, Value>> {
        check_record(&self.vertex_type(label)?.fields, label, values)
    }

    /// Check and coerce the fields of a new edge
    pub fn check_edge(
        &self,
        label: &str,
        values: &[(&str, Value)],
    ) -> StoreResult<BTreeMap<String, Value>> {
        check_record(&self.edge_type(label)?.fields, label, values)
    }

    /// Check and coerce a single vertex field update
    pub fn check_vertex_field(&self, label: &str, name: &str, value: Value) -> StoreResult<Value> {
        find_spec(&self.vertex_type(label)?.fields, label, name)?.check(value)
    }

    /// Check and coerce a single edge field update
    pub fn check_edge_field(&self, label: &str, name: &str, value: Value) -> StoreResult<Value> {
        find_spec(&self.edge_type(label)?.fields, label, name)?.check(value)
    }

    /// Check if no types are declared
    pub fn is_empty(&self) -> bool {
        self.vertex_types.is_empty() && self.edge_types.is_empty()
    }
}
