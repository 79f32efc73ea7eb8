//! Append planner: insert every arriving row

use super::KeyPlanner;
use crate::error::PipelineResult;
use crate::mutation::{MutationType, PlannedRow};
use crate::row::Row;
use std::collections::HashSet;

/// Key-scoped planner that emits one `Insert` per arriving row.
///
/// Existing state is ignored. Conflict policy: one mutation per arriving
/// row, in arrival order; deduplication is the sink's concern. Replaying a
/// batch against an insert-only sink therefore duplicates rows.
#[derive(Debug, Default, Clone)]
pub struct AppendPlanner;

impl AppendPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl KeyPlanner for AppendPlanner {
    fn plan_mutations_for_key(
        &self,
        _key: &Row,
        arriving: &[Row],
        _existing: &[Row],
    ) -> PipelineResult<Vec<PlannedRow>> {
        Ok(arriving
            .iter()
            .map(|row| PlannedRow::new(MutationType::Insert, row.clone()))
            .collect())
    }

    fn emitted_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([MutationType::Insert])
    }
}
