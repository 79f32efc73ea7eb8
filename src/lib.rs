//! Plan-then-apply mutation engine for batch and micro-batch ETL pipelines
//!
//! Named steps produce tabular batches; steps with a write target plan the
//! mutations (insert, update, upsert, delete) needed to merge the arriving
//! batch into already-persisted sink state, then apply them batched per
//! parallel processing unit.
//!
//! # Features
//!
//! - **Two planning shapes**: key-scoped (per-key merge decisions against
//!   looked-up existing state) and set-scoped (one pass over the whole batch,
//!   per-key resolution delegated to the sink)
//! - **Batched state lookup**: one existing-state call per processing unit
//!   over its full distinct key set, never one per key
//! - **Startup validation**: planner/sink shape and mutation-type
//!   compatibility checked before any row flows
//! - **Per-unit clients**: sink clients constructed lazily, owned exclusively
//!   by one unit, released on every exit path
//! - **Explicit registry**: planner and sink constructors resolved by type
//!   name, populated once at process start
//!
//! # Example Configuration
//!
//! ```toml
//! name = "customers"
//! key_fields = ["id"]
//! parallelism = 8
//!
//! [planner]
//! type = "upsert"
//! ordering_field = "updated_at"
//!
//! [sink]
//! type = "memory"
//! key_fields = ["id"]
//! ```

pub mod apply;
pub mod batch;
pub mod config;
pub mod derive;
pub mod error;
pub mod join;
pub mod key;
pub mod mutation;
pub mod planner;
pub mod registry;
pub mod row;
pub mod sink;
pub mod step;
pub mod validate;

pub use batch::{Batch, RowSet};
pub use config::{ComponentConfig, StepConfig};
pub use error::{PipelineError, PipelineResult};
pub use key::KeyExtractor;
pub use mutation::{MutationType, PlannedRow};
pub use planner::{BulkPlanner, KeyPlanner, Planner};
pub use registry::Registry;
pub use row::{Field, FieldType, Row, Schema, Value};
pub use sink::{BulkSink, KeyedSink, KeyedSinkClient, Sink};
pub use step::Step;
