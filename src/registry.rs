//! Component registry: explicit type-name to constructor mapping
//!
//! Populated once at process start, looked up once at step construction.
//! There is no implicit global registration and no registration ordering to
//! reason about.

use crate::error::{PipelineError, PipelineResult};
use crate::planner::{AppendPlanner, BulkInsertPlanner, BulkUpsertPlanner, Planner, UpsertPlanner};
use crate::sink::{MemorySink, Sink};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor building a planner from its component options
pub type PlannerCtor = fn(&toml::Table) -> PipelineResult<Planner>;

/// Constructor building a sink from its component options
pub type SinkCtor = fn(&toml::Table) -> PipelineResult<Sink>;

/// Name-indexed constructors for planners and sinks
#[derive(Default)]
pub struct Registry {
    planners: HashMap<String, PlannerCtor>,
    sinks: HashMap<String, SinkCtor>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in planners and sinks
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_planner("append", build_append_planner);
        registry.register_planner("upsert", build_upsert_planner);
        registry.register_planner("bulk_insert", build_bulk_insert_planner);
        registry.register_planner("bulk_upsert", build_bulk_upsert_planner);

        registry.register_sink("memory", build_memory_sink);
        registry.register_sink("memory_bulk", build_memory_bulk_sink);

        registry
    }

    pub fn register_planner(&mut self, name: impl Into<String>, ctor: PlannerCtor) {
        self.planners.insert(name.into(), ctor);
    }

    pub fn register_sink(&mut self, name: impl Into<String>, ctor: SinkCtor) {
        self.sinks.insert(name.into(), ctor);
    }

    /// Construct the named planner from its options
    pub fn planner(&self, name: &str, options: &toml::Table) -> PipelineResult<Planner> {
        let ctor = self.planners.get(name).ok_or_else(|| {
            PipelineError::config(format!("no planner registered under name '{}'", name))
        })?;

        ctor(options)
    }

    /// Construct the named sink from its options
    pub fn sink(&self, name: &str, options: &toml::Table) -> PipelineResult<Sink> {
        let ctor = self.sinks.get(name).ok_or_else(|| {
            PipelineError::config(format!("no sink registered under name '{}'", name))
        })?;

        ctor(options)
    }
}

fn build_append_planner(_options: &toml::Table) -> PipelineResult<Planner> {
    Ok(Planner::Keyed(Arc::new(AppendPlanner::new())))
}

fn build_upsert_planner(options: &toml::Table) -> PipelineResult<Planner> {
    let planner = match options.get("ordering_field") {
        Some(value) => {
            let field = value.as_str().ok_or_else(|| {
                PipelineError::config("upsert planner option 'ordering_field' must be a string")
            })?;
            UpsertPlanner::with_ordering_field(field)
        }
        None => UpsertPlanner::new(),
    };

    Ok(Planner::Keyed(Arc::new(planner)))
}

fn build_bulk_insert_planner(_options: &toml::Table) -> PipelineResult<Planner> {
    Ok(Planner::Bulk(Arc::new(BulkInsertPlanner::new())))
}

fn build_bulk_upsert_planner(_options: &toml::Table) -> PipelineResult<Planner> {
    Ok(Planner::Bulk(Arc::new(BulkUpsertPlanner::new())))
}

fn memory_sink_from_options(options: &toml::Table) -> PipelineResult<MemorySink> {
    let key_fields = options
        .get("key_fields")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            PipelineError::config("memory sink requires a 'key_fields' array of field names")
        })?;

    let key_field_names = key_fields
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                PipelineError::config("memory sink 'key_fields' entries must be strings")
            })
        })
        .collect::<PipelineResult<Vec<String>>>()?;

    if key_field_names.is_empty() {
        return Err(PipelineError::config(
            "memory sink 'key_fields' must not be empty",
        ));
    }

    Ok(MemorySink::new(key_field_names))
}

fn build_memory_sink(options: &toml::Table) -> PipelineResult<Sink> {
    Ok(memory_sink_from_options(options)?.into_keyed())
}

fn build_memory_bulk_sink(options: &toml::Table) -> PipelineResult<Sink> {
    Ok(memory_sink_from_options(options)?.into_bulk())
}
