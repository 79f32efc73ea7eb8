//! Set-scoped planners: one mutation group over the whole batch
//!
//! Suited to sinks whose native primitive already performs per-key
//! resolution, such as a declarative merge statement or a plain bulk load.

use super::BulkPlanner;
use crate::batch::{Batch, RowSet};
use crate::error::PipelineResult;
use crate::mutation::MutationType;
use std::collections::HashSet;

/// Emits the entire arriving batch as a single `Insert` group. No rows are
/// filtered or deduplicated.
#[derive(Debug, Default, Clone)]
pub struct BulkInsertPlanner;

impl BulkInsertPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl BulkPlanner for BulkInsertPlanner {
    fn plan_mutations_for_set(
        &self,
        arriving: &Batch,
    ) -> PipelineResult<Vec<(MutationType, RowSet)>> {
        Ok(vec![(MutationType::Insert, arriving.clone())])
    }

    fn emitted_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([MutationType::Insert])
    }
}

/// Emits the entire arriving batch as a single `Upsert` group, delegating
/// per-key conflict resolution to the sink.
#[derive(Debug, Default, Clone)]
pub struct BulkUpsertPlanner;

impl BulkUpsertPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl BulkPlanner for BulkUpsertPlanner {
    fn plan_mutations_for_set(
        &self,
        arriving: &Batch,
    ) -> PipelineResult<Vec<(MutationType, RowSet)>> {
        Ok(vec![(MutationType::Upsert, arriving.clone())])
    }

    fn emitted_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([MutationType::Upsert])
    }
}
