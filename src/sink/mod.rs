//! Sink contracts: the persistent stores receiving planned mutations
//!
//! A sink is either key-scoped (random lookups and row mutations) or
//! set-scoped (bulk group application); the two are independent capability
//! traits matched against the planner shape at step construction.
//!
//! Key-scoped sinks separate the provider (shared, `Send + Sync`, capability
//! declarations) from the client (per processing unit, constructed lazily,
//! never shared between units). A client releases its resources on drop, so
//! every exit path of the owning unit — success, failure, or cancellation —
//! returns the connection.

mod memory;

pub use memory::MemorySink;

use crate::batch::RowSet;
use crate::error::PipelineResult;
use crate::mutation::{MutationType, PlannedRow};
use crate::row::Row;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Provider of key-scoped sink clients
#[async_trait]
pub trait KeyedSink: Send + Sync {
    /// The mutation types this sink can apply; declared statically, checked
    /// once at step construction
    fn supported_mutation_types(&self) -> HashSet<MutationType>;

    /// Open one client for the calling processing unit
    async fn connect(&self) -> PipelineResult<Box<dyn KeyedSinkClient>>;
}

/// A unit-owned client for a key-scoped sink
#[async_trait]
pub trait KeyedSinkClient: Send {
    /// Fetch every persisted row matching any of the given keys.
    ///
    /// Must accept an empty set (and return no rows for it). Rows for keys
    /// outside the requested set may be returned by conservative sinks; the
    /// joiner filters them out.
    async fn existing_for_keys(&mut self, keys: &HashSet<Row>) -> PipelineResult<Vec<Row>>;

    /// Apply a batch of planned mutations. Called at most once per unit per
    /// execution, with the unit's full list. At-least-once semantics unless
    /// the implementation documents stronger guarantees.
    async fn apply_mutations(&mut self, mutations: Vec<PlannedRow>) -> PipelineResult<()>;
}

/// A set-scoped sink applying whole mutation groups
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// The mutation types this sink can apply in bulk
    fn supported_mutation_types(&self) -> HashSet<MutationType>;

    /// Apply the planner-ordered mutation groups, sequentially and in order
    async fn apply_bulk_mutations(
        &self,
        planned: Vec<(MutationType, RowSet)>,
    ) -> PipelineResult<()>;
}

/// A sink of either shape, as resolved from configuration
#[derive(Clone)]
pub enum Sink {
    Keyed(Arc<dyn KeyedSink>),
    Bulk(Arc<dyn BulkSink>),
}

impl Sink {
    pub fn supported_mutation_types(&self) -> HashSet<MutationType> {
        match self {
            Sink::Keyed(s) => s.supported_mutation_types(),
            Sink::Bulk(s) => s.supported_mutation_types(),
        }
    }

    /// Shape name for error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Sink::Keyed(_) => "key-scoped",
            Sink::Bulk(_) => "set-scoped",
        }
    }
}
