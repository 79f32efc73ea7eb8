//! Mutation types and planned rows

use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The operation a planned row requests of the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum MutationType {
    Insert,
    Update,
    Upsert,
    Delete,
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationType::Insert => "insert",
            MutationType::Update => "update",
            MutationType::Upsert => "upsert",
            MutationType::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The unit of work handed to the applier: one row paired with the
/// mutation the sink should perform for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRow {
    mutation_type: MutationType,
    row: Row,
}

impl PlannedRow {
    pub fn new(mutation_type: MutationType, row: Row) -> Self {
        Self { mutation_type, row }
    }

    pub fn mutation_type(&self) -> MutationType {
        self.mutation_type
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn into_row(self) -> Row {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_type_display() {
        assert_eq!(MutationType::Upsert.to_string(), "upsert");
        assert_eq!(MutationType::Delete.to_string(), "delete");
    }

    #[test]
    fn test_mutation_type_serde_roundtrip() {
        let parsed: MutationType = toml::Value::String("insert".to_string())
            .try_into()
            .unwrap();
        assert_eq!(parsed, MutationType::Insert);
    }
}
