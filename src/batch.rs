//! In-memory batch of rows sharing one schema
//!
//! Stands in at the seam the external execution engine's distributed dataset
//! would occupy: immutable once built, replayable by cloning, consumed once
//! per step execution.

use crate::error::{PipelineError, PipelineResult};
use crate::row::{Row, Schema};
use std::sync::Arc;

/// A bounded slice of rows, all conforming to the batch schema
#[derive(Debug, Clone)]
pub struct Batch {
    schema: Arc<Schema>,
    rows: Vec<Row>,
}

/// Alias used by bulk planners: each emitted mutation group carries one
pub type RowSet = Batch;

impl Batch {
    /// An empty batch with the given schema
    pub fn empty(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Build a batch, verifying every row carries the batch schema
    pub fn from_rows(schema: Arc<Schema>, rows: Vec<Row>) -> PipelineResult<Self> {
        for row in &rows {
            if **row.schema() != *schema {
                return Err(PipelineError::planning(
                    "batch rows must all conform to the batch schema",
                ));
            }
        }

        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Concatenate another batch with the same schema onto this one
    pub fn union(self, other: Batch) -> PipelineResult<Batch> {
        if *self.schema != *other.schema {
            return Err(PipelineError::planning(
                "cannot union batches with differing schemas",
            ));
        }

        let mut rows = self.rows;
        rows.extend(other.rows);

        Ok(Batch {
            schema: self.schema,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Field, FieldType, Value};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![Field::new("id", FieldType::Int)]))
    }

    fn row(schema: &Arc<Schema>, id: i64) -> Row {
        Row::new(Arc::clone(schema), vec![Value::Int(id)]).unwrap()
    }

    #[test]
    fn test_from_rows_rejects_foreign_schema() {
        let s = schema();
        let other = Arc::new(Schema::new(vec![Field::new("x", FieldType::String)]));
        let foreign = Row::new(other, vec![Value::from("a")]).unwrap();

        assert!(Batch::from_rows(s, vec![foreign]).is_err());
    }

    #[test]
    fn test_union_concatenates() {
        let s = schema();
        let a = Batch::from_rows(Arc::clone(&s), vec![row(&s, 1)]).unwrap();
        let b = Batch::from_rows(Arc::clone(&s), vec![row(&s, 2), row(&s, 3)]).unwrap();

        let unioned = a.union(b).unwrap();
        assert_eq!(unioned.len(), 3);
        assert_eq!(unioned.rows()[2].value("id"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_union_schema_mismatch() {
        let s = schema();
        let other = Arc::new(Schema::new(vec![Field::new("x", FieldType::String)]));
        let a = Batch::empty(s);
        let b = Batch::empty(other);

        assert!(a.union(b).is_err());
    }
}
