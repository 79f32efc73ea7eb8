//! In-memory reference sink
//!
//! Implements both sink shapes over a shared key→rows map. Used by this
//! crate's own tests and as the template for transport-backed sinks.
//!
//! Mutation semantics:
//! - `Insert` appends, so replaying an insert-only batch duplicates rows
//! - `Update` replaces the rows for a key and fails when the key is absent
//! - `Upsert` replaces-or-creates
//! - `Delete` removes the key; deleting an absent key is a no-op

use super::{BulkSink, KeyedSink, KeyedSinkClient, Sink};
use crate::batch::RowSet;
use crate::error::{PipelineError, PipelineResult};
use crate::key::KeyExtractor;
use crate::mutation::{MutationType, PlannedRow};
use crate::row::Row;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::debug;

type State = Arc<Mutex<HashMap<Row, Vec<Row>>>>;

/// A sink persisting rows in process memory, keyed by the configured fields
#[derive(Debug, Clone)]
pub struct MemorySink {
    key_field_names: Vec<String>,
    state: State,
}

impl MemorySink {
    pub fn new(key_field_names: Vec<String>) -> Self {
        Self {
            key_field_names,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wrap in the key-scoped shape
    pub fn into_keyed(self) -> Sink {
        Sink::Keyed(Arc::new(self))
    }

    /// Wrap in the set-scoped shape
    pub fn into_bulk(self) -> Sink {
        Sink::Bulk(Arc::new(self))
    }

    /// All persisted rows, in unspecified order
    pub fn snapshot(&self) -> Vec<Row> {
        self.state
            .lock()
            .expect("memory sink state lock poisoned")
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// Persisted rows for one key
    pub fn rows_for_key(&self, key: &Row) -> Vec<Row> {
        self.state
            .lock()
            .expect("memory sink state lock poisoned")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn key_count(&self) -> usize {
        self.state
            .lock()
            .expect("memory sink state lock poisoned")
            .len()
    }

    fn key_of(&self, row: &Row) -> PipelineResult<Row> {
        let extractor = KeyExtractor::new(row.schema(), &self.key_field_names)
            .map_err(|e| PipelineError::sink(format!("row not addressable by sink key: {}", e)))?;
        extractor.extract(row)
    }

    fn apply_one(
        &self,
        state: &mut HashMap<Row, Vec<Row>>,
        mutation_type: MutationType,
        row: Row,
    ) -> PipelineResult<()> {
        let key = self.key_of(&row)?;

        match mutation_type {
            MutationType::Insert => {
                state.entry(key).or_default().push(row);
            }
            MutationType::Update => {
                let entry = state.get_mut(&key).ok_or_else(|| {
                    PipelineError::sink("update requested for a key with no persisted rows")
                })?;
                *entry = vec![row];
            }
            MutationType::Upsert => {
                state.insert(key, vec![row]);
            }
            MutationType::Delete => {
                state.remove(&key);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl KeyedSink for MemorySink {
    fn supported_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([
            MutationType::Insert,
            MutationType::Update,
            MutationType::Upsert,
            MutationType::Delete,
        ])
    }

    async fn connect(&self) -> PipelineResult<Box<dyn KeyedSinkClient>> {
        Ok(Box::new(MemorySinkClient {
            sink: self.clone(),
        }))
    }
}

/// Per-unit client over the shared memory state
struct MemorySinkClient {
    sink: MemorySink,
}

#[async_trait]
impl KeyedSinkClient for MemorySinkClient {
    async fn existing_for_keys(&mut self, keys: &HashSet<Row>) -> PipelineResult<Vec<Row>> {
        let state = self
            .sink
            .state
            .lock()
            .expect("memory sink state lock poisoned");

        let mut rows = Vec::new();
        for key in keys {
            if let Some(existing) = state.get(key) {
                rows.extend(existing.iter().cloned());
            }
        }

        Ok(rows)
    }

    async fn apply_mutations(&mut self, mutations: Vec<PlannedRow>) -> PipelineResult<()> {
        debug!("applying {} mutations to memory sink", mutations.len());

        let mut state = self
            .sink
            .state
            .lock()
            .expect("memory sink state lock poisoned");

        for planned in mutations {
            let mutation_type = planned.mutation_type();
            self.sink
                .apply_one(&mut state, mutation_type, planned.into_row())?;
        }

        Ok(())
    }
}

#[async_trait]
impl BulkSink for MemorySink {
    fn supported_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([
            MutationType::Insert,
            MutationType::Upsert,
            MutationType::Delete,
        ])
    }

    async fn apply_bulk_mutations(
        &self,
        planned: Vec<(MutationType, RowSet)>,
    ) -> PipelineResult<()> {
        let mut state = self.state.lock().expect("memory sink state lock poisoned");

        for (mutation_type, set) in planned {
            debug!(
                "applying bulk {} group of {} rows to memory sink",
                mutation_type,
                set.len()
            );

            for row in set.into_rows() {
                self.apply_one(&mut state, mutation_type, row)?;
            }
        }

        Ok(())
    }
}
