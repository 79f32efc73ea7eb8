//! Step orchestrator: wires extraction, join, planning, and application
//!
//! A step is constructed from configuration once, validating planner/sink
//! compatibility before any row flows, and then executes over one arriving
//! batch per cycle. The key-scoped path fans the key groups out across
//! concurrent processing units with zero shared mutable state; each unit
//! owns its own lazily constructed sink clients.

use crate::apply;
use crate::batch::Batch;
use crate::config::StepConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::join;
use crate::key::KeyExtractor;
use crate::mutation::PlannedRow;
use crate::planner::{KeyPlanner, Planner};
use crate::registry::Registry;
use crate::row::Row;
use crate::sink::{KeyedSink, Sink};
use crate::validate::validate_compatibility;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info};

/// A named pipeline step, optionally writing its batch through a sink
pub struct Step {
    name: String,
    cache: bool,
    hint_small: bool,
    parallelism: usize,
    write: Option<WriteSpec>,
}

struct WriteSpec {
    planner: Planner,
    sink: Sink,
    key_fields: Vec<String>,
}

impl Step {
    /// Construct a step with an explicit planner and sink.
    ///
    /// Runs the compatibility validator and checks the key-field list for
    /// key-scoped planners; both fail here, before any row is read.
    pub fn new(
        name: impl Into<String>,
        key_fields: Vec<String>,
        parallelism: usize,
        planner: Planner,
        sink: Sink,
        planner_name: &str,
        sink_name: &str,
    ) -> PipelineResult<Self> {
        let name = name.into();

        if parallelism == 0 {
            return Err(PipelineError::config(format!(
                "step '{}' parallelism must be at least 1",
                name
            )));
        }

        validate_compatibility(&planner, &sink, planner_name, sink_name)?;

        if matches!(planner, Planner::Keyed(_)) && key_fields.is_empty() {
            return Err(PipelineError::config(format!(
                "step '{}' uses a key-scoped planner but declares no key fields",
                name
            )));
        }

        Ok(Self {
            name,
            cache: true,
            hint_small: false,
            parallelism,
            write: Some(WriteSpec {
                planner,
                sink,
                key_fields,
            }),
        })
    }

    /// Construct a step from configuration, resolving planner and sink
    /// through the registry
    pub fn from_config(config: &StepConfig, registry: &Registry) -> PipelineResult<Self> {
        config.validate()?;

        let write = match (&config.planner, &config.sink) {
            (Some(planner_config), Some(sink_config)) => {
                let planner = registry.planner(&planner_config.kind, &planner_config.options)?;
                let sink = registry.sink(&sink_config.kind, &sink_config.options)?;

                validate_compatibility(&planner, &sink, &planner_config.kind, &sink_config.kind)?;

                if matches!(planner, Planner::Keyed(_)) && config.key_fields.is_empty() {
                    return Err(PipelineError::config(format!(
                        "step '{}' uses a key-scoped planner but declares no key fields",
                        config.name
                    )));
                }

                Some(WriteSpec {
                    planner,
                    sink,
                    key_fields: config.key_fields.clone(),
                })
            }
            _ => None,
        };

        Ok(Self {
            name: config.name.clone(),
            cache: config.cache,
            hint_small: config.hint_small,
            parallelism: config.parallelism,
            write,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one cycle over the arriving batch, consuming it.
    ///
    /// Steps without a write target succeed trivially; the batch lifecycle
    /// flags are advisory for the in-memory dataset and surfaced in logs.
    pub async fn execute(&self, arriving: Batch) -> PipelineResult<()> {
        info!(
            "executing step '{}' over {} arriving rows",
            self.name,
            arriving.len()
        );

        if self.cache {
            debug!("step '{}': batch caching requested", self.name);
        }
        if self.hint_small {
            debug!("step '{}': small-batch broadcast hint set", self.name);
        }

        let spec = match &self.write {
            Some(spec) => spec,
            None => return Ok(()),
        };

        match (&spec.planner, &spec.sink) {
            (Planner::Keyed(planner), Sink::Keyed(sink)) => {
                self.write_keyed(
                    arriving,
                    Arc::clone(planner),
                    Arc::clone(sink),
                    &spec.key_fields,
                )
                .await
            }
            (Planner::Bulk(planner), Sink::Bulk(sink)) => {
                let planned = planner.plan_mutations_for_set(&arriving)?;
                apply::apply_bulk_mutations(sink.as_ref(), planned).await
            }
            // Ruled out by validation at construction
            _ => Err(PipelineError::config(format!(
                "step '{}' holds mismatched planner and sink shapes",
                self.name
            ))),
        }
    }

    async fn write_keyed(
        &self,
        arriving: Batch,
        planner: Arc<dyn KeyPlanner>,
        sink: Arc<dyn KeyedSink>,
        key_fields: &[String],
    ) -> PipelineResult<()> {
        let extractor = KeyExtractor::new(arriving.schema(), key_fields)?;

        let groups = join::group_by_key(arriving.into_rows(), &extractor)?;
        debug!(
            "step '{}': {} key groups across {} units",
            self.name,
            groups.len(),
            self.parallelism
        );

        let mut partitions: Vec<Vec<(Row, Vec<Row>)>> =
            (0..self.parallelism).map(|_| Vec::new()).collect();
        for (key, rows) in groups {
            let unit = partition_for(&key, self.parallelism);
            partitions[unit].push((key, rows));
        }

        let mut handles = Vec::new();
        for (unit, partition) in partitions.into_iter().enumerate() {
            if partition.is_empty() {
                continue;
            }

            let planner = Arc::clone(&planner);
            let sink = Arc::clone(&sink);
            let extractor = extractor.clone();

            handles.push(tokio::spawn(async move {
                let joined =
                    join::join_existing_for_partition(partition, sink.as_ref(), &extractor)
                        .await?;

                let mut planned: Vec<PlannedRow> = Vec::new();
                for records in &joined {
                    planned.extend(planner.plan_mutations_for_key(
                        &records.key,
                        &records.arriving,
                        &records.existing,
                    )?);
                }

                debug!(
                    "unit {}: planned {} mutations for {} keys",
                    unit,
                    planned.len(),
                    joined.len()
                );

                apply::apply_mutations_for_partition(sink.as_ref(), planned).await
            }));
        }

        for handle in handles {
            handle.await.map_err(|e| {
                PipelineError::planning(format!("processing unit failed: {}", e))
            })??;
        }

        info!("step '{}' write complete", self.name);
        Ok(())
    }
}

/// Stable assignment of a key to a processing unit
fn partition_for(key: &Row, units: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % units
}
