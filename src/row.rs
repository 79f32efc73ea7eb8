//! Immutable row, schema, and value model
//!
//! Rows are immutable value carriers with an attached schema reference: any
//! transformation produces a new row, which keeps planner purity mechanically
//! checkable. Equality and hashing are structural over (schema, values), so a
//! projected key row works directly as a hash-grouping key.

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Logical type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    Binary,
    Timestamp,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Binary => "binary",
            FieldType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A named, typed field within a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: FieldType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered sequence of (name, type) pairs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index of the named field, if present
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    /// Project this schema down to the named fields, preserving the order in
    /// which the names are given. Fails if any name is absent.
    pub fn subset(&self, field_names: &[String]) -> PipelineResult<Schema> {
        let mut fields = Vec::with_capacity(field_names.len());

        for name in field_names {
            let field = self.field(name).ok_or_else(|| {
                PipelineError::config(format!("field '{}' not found in schema", name))
            })?;
            fields.push(field.clone());
        }

        Ok(Schema::new(fields))
    }
}

/// A single typed value
///
/// `Float` compares and hashes by bit pattern so values can serve as hash
/// keys; for grouping purposes NaN equals NaN.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Ordering between two values of the same variant; `None` when the
    /// variants differ or the variant carries no ordering (Null)
    pub fn try_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Binary(v) => v.hash(state),
            Value::Timestamp(v) => v.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// An immutable row conforming to exactly one schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row; the value count must match the schema arity
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> PipelineResult<Self> {
        if values.len() != schema.len() {
            return Err(PipelineError::planning(format!(
                "row has {} values but schema has {} fields",
                values.len(),
                schema.len()
            )));
        }

        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a field position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the named field
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.schema.field_index(name).map(|i| &self.values[i])
    }

    /// Build a new row for the target schema, pulling each field by name
    /// from this row. Fails if this row does not carry a target field.
    pub fn project(&self, target: &Arc<Schema>) -> PipelineResult<Row> {
        let mut values = Vec::with_capacity(target.len());

        for field in target.fields() {
            let value = self.value(&field.name).ok_or_else(|| {
                PipelineError::planning(format!(
                    "row does not carry field '{}' required by projection",
                    field.name
                ))
            })?;
            values.push(value.clone());
        }

        Row::new(Arc::clone(target), values)
    }

    /// Derive a new row with the named field replaced; never mutates
    pub fn with_value(&self, name: &str, value: Value) -> PipelineResult<Row> {
        let index = self.schema.field_index(name).ok_or_else(|| {
            PipelineError::planning(format!("row does not carry field '{}'", name))
        })?;

        let mut values = self.values.clone();
        values[index] = value;

        Row::new(Arc::clone(&self.schema), values)
    }
}
