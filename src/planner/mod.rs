//! Planner contracts and shipped planner implementations
//!
//! Planners are pure functions from arriving (and, for the key-scoped shape,
//! existing) data to mutations. The two shapes are independent capability
//! traits, not a shared base: the compatibility validator pattern-matches on
//! the [`Planner`] enum rather than downcasting.
//!
//! Conflict resolution for multiple arriving rows sharing one key within a
//! single cycle is planner-specific; each implementation documents its
//! policy.

mod append;
mod bulk;
mod upsert;

pub use append::AppendPlanner;
pub use bulk::{BulkInsertPlanner, BulkUpsertPlanner};
pub use upsert::UpsertPlanner;

use crate::batch::{Batch, RowSet};
use crate::error::PipelineResult;
use crate::mutation::{MutationType, PlannedRow};
use crate::row::Row;
use std::collections::HashSet;
use std::sync::Arc;

/// Key-scoped planner: mutation decisions made independently per unique key.
///
/// `plan_mutations_for_key` must be side-effect-free and perform no I/O; it
/// is called once per key per processing unit. Implementations must handle
/// zero existing rows, multiple existing rows per key, and multiple arriving
/// rows per key.
pub trait KeyPlanner: Send + Sync {
    fn plan_mutations_for_key(
        &self,
        key: &Row,
        arriving: &[Row],
        existing: &[Row],
    ) -> PipelineResult<Vec<PlannedRow>>;

    /// The mutation types this planner may emit
    fn emitted_mutation_types(&self) -> HashSet<MutationType>;
}

/// Set-scoped planner: runs once over the entire arriving batch, emitting
/// mutation groups whose per-key resolution is delegated to the sink.
pub trait BulkPlanner: Send + Sync {
    fn plan_mutations_for_set(&self, arriving: &Batch)
        -> PipelineResult<Vec<(MutationType, RowSet)>>;

    /// The mutation types this planner may emit
    fn emitted_mutation_types(&self) -> HashSet<MutationType>;
}

/// A planner of either shape, as resolved from configuration
#[derive(Clone)]
pub enum Planner {
    Keyed(Arc<dyn KeyPlanner>),
    Bulk(Arc<dyn BulkPlanner>),
}

impl Planner {
    pub fn emitted_mutation_types(&self) -> HashSet<MutationType> {
        match self {
            Planner::Keyed(p) => p.emitted_mutation_types(),
            Planner::Bulk(p) => p.emitted_mutation_types(),
        }
    }

    /// Shape name for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Planner::Keyed(_) => "key-scoped",
            Planner::Bulk(_) => "set-scoped",
        }
    }
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner").field("shape", &self.shape()).finish()
    }
}
