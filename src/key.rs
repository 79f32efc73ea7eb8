//! Key extraction: projecting rows down to their key fields
//!
//! The key schema is derived once at construction and reused for every
//! extraction, including re-projection of rows returned by a sink lookup
//! (which may carry a wider schema than the arriving batch).

use crate::error::{PipelineError, PipelineResult};
use crate::row::{Row, Schema, Value};
use std::sync::Arc;

/// Projects a row down to its configured key fields
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    base_schema: Arc<Schema>,
    key_schema: Arc<Schema>,
    // Positions of the key fields within the base schema
    indices: Vec<usize>,
}

impl KeyExtractor {
    /// Derive the key schema from the arriving batch schema.
    ///
    /// Fails with a configuration error if the key field list is empty or any
    /// name is absent from the schema; both are checked once here, not per row.
    pub fn new(schema: &Arc<Schema>, key_field_names: &[String]) -> PipelineResult<Self> {
        if key_field_names.is_empty() {
            return Err(PipelineError::config("key field list must not be empty"));
        }

        let key_schema = Arc::new(schema.subset(key_field_names)?);

        let indices = key_field_names
            .iter()
            .map(|name| {
                schema
                    .field_index(name)
                    .expect("presence verified by subset")
            })
            .collect();

        Ok(Self {
            base_schema: Arc::clone(schema),
            key_schema,
            indices,
        })
    }

    /// The schema shared by every extracted key
    pub fn key_schema(&self) -> &Arc<Schema> {
        &self.key_schema
    }

    /// Project a row to its key: exactly the key fields, original order,
    /// original values.
    ///
    /// Rows carrying the base schema take the precomputed index path; rows
    /// from other schemas (e.g. sink lookup results) are projected by name.
    pub fn extract(&self, row: &Row) -> PipelineResult<Row> {
        if Arc::ptr_eq(row.schema(), &self.base_schema) || **row.schema() == *self.base_schema {
            let values: Vec<Value> = self
                .indices
                .iter()
                .map(|&i| row.values()[i].clone())
                .collect();
            return Row::new(Arc::clone(&self.key_schema), values);
        }

        row.project(&self.key_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Field, FieldType};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("region", FieldType::String),
            Field::new("id", FieldType::Int),
            Field::new("val", FieldType::String),
        ]))
    }

    #[test]
    fn test_extract_preserves_order_values_and_types() {
        let schema = schema();
        let extractor =
            KeyExtractor::new(&schema, &["id".to_string(), "region".to_string()]).unwrap();

        let row = Row::new(
            Arc::clone(&schema),
            vec![Value::from("emea"), Value::Int(42), Value::from("x")],
        )
        .unwrap();

        let key = extractor.extract(&row).unwrap();
        assert_eq!(key.schema().len(), 2);
        assert_eq!(key.schema().fields()[0].name, "id");
        assert_eq!(key.schema().fields()[0].data_type, FieldType::Int);
        assert_eq!(key.schema().fields()[1].name, "region");
        assert_eq!(key.values(), &[Value::Int(42), Value::from("emea")]);
    }

    #[test]
    fn test_empty_key_field_list_rejected() {
        let err = KeyExtractor::new(&schema(), &[]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_key_field_rejected() {
        let err = KeyExtractor::new(&schema(), &["absent".to_string()]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_extract_from_foreign_schema_by_name() {
        let arriving = schema();
        let extractor = KeyExtractor::new(&arriving, &["id".to_string()]).unwrap();

        // Sink rows carry an extra column and a different field order
        let sink_schema = Arc::new(Schema::new(vec![
            Field::new("stored_at", FieldType::Timestamp),
            Field::new("id", FieldType::Int),
        ]));
        let sink_row = Row::new(
            sink_schema,
            vec![Value::Timestamp(chrono::Utc::now()), Value::Int(42)],
        )
        .unwrap();

        let key = extractor.extract(&sink_row).unwrap();
        assert_eq!(key.values(), &[Value::Int(42)]);
        assert_eq!(key.schema(), extractor.key_schema());
    }

    #[test]
    fn test_keys_from_both_paths_are_equal() {
        let arriving = schema();
        let extractor = KeyExtractor::new(&arriving, &["id".to_string()]).unwrap();

        let fast = extractor
            .extract(
                &Row::new(
                    Arc::clone(&arriving),
                    vec![Value::from("emea"), Value::Int(7), Value::from("v")],
                )
                .unwrap(),
            )
            .unwrap();

        let foreign_schema = Arc::new(Schema::new(vec![Field::new("id", FieldType::Int)]));
        let slow = extractor
            .extract(&Row::new(foreign_schema, vec![Value::Int(7)]).unwrap())
            .unwrap();

        assert_eq!(fast, slow);
    }
}
