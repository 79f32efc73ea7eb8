//! Mutation application: deliver planned mutations to the sink
//!
//! No retry, no deduplication, no rollback: a unit's apply call either fully
//! succeeds or fully fails from this layer's perspective, and failures
//! propagate to the execution engine.

use crate::batch::RowSet;
use crate::error::PipelineResult;
use crate::mutation::{MutationType, PlannedRow};
use crate::sink::{BulkSink, KeyedSink};
use tracing::debug;

/// Apply one unit's planned rows through a key-scoped sink.
///
/// Connects one client lazily — never when the unit planned nothing — and
/// invokes the sink's batched apply exactly once with the full local list,
/// in grouping-emission order. The client is released when this returns.
pub async fn apply_mutations_for_partition(
    sink: &dyn KeyedSink,
    planned: Vec<PlannedRow>,
) -> PipelineResult<()> {
    if planned.is_empty() {
        return Ok(());
    }

    debug!("applying {} planned rows for unit", planned.len());

    let mut client = sink.connect().await?;
    client.apply_mutations(planned).await
}

/// Apply set-scoped mutation groups, in planner-declared order.
///
/// This layer introduces no additional partitioning; the sink receives the
/// full ordered group list in one call and processes it sequentially.
pub async fn apply_bulk_mutations(
    sink: &dyn BulkSink,
    planned: Vec<(MutationType, RowSet)>,
) -> PipelineResult<()> {
    if planned.is_empty() {
        return Ok(());
    }

    debug!("applying {} bulk mutation groups", planned.len());

    sink.apply_bulk_mutations(planned).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::row::{Field, FieldType, Row, Schema, Value};
    use crate::sink::KeyedSinkClient;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        connects: Arc<AtomicUsize>,
        applies: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl KeyedSink for CountingSink {
        fn supported_mutation_types(&self) -> HashSet<MutationType> {
            HashSet::from([MutationType::Insert])
        }

        async fn connect(&self) -> PipelineResult<Box<dyn KeyedSinkClient>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingClient {
                applies: Arc::clone(&self.applies),
            }))
        }
    }

    struct CountingClient {
        applies: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl KeyedSinkClient for CountingClient {
        async fn existing_for_keys(&mut self, _keys: &HashSet<Row>) -> PipelineResult<Vec<Row>> {
            Err(PipelineError::sink("not used in this test"))
        }

        async fn apply_mutations(&mut self, _mutations: Vec<PlannedRow>) -> PipelineResult<()> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn planned_row() -> PlannedRow {
        let schema = Arc::new(Schema::new(vec![Field::new("id", FieldType::Int)]));
        let row = Row::new(schema, vec![Value::Int(1)]).unwrap();
        PlannedRow::new(MutationType::Insert, row)
    }

    #[tokio::test]
    async fn test_one_apply_call_per_unit() {
        let connects = Arc::new(AtomicUsize::new(0));
        let applies = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            connects: Arc::clone(&connects),
            applies: Arc::clone(&applies),
        };

        apply_mutations_for_partition(&sink, vec![planned_row(), planned_row()])
            .await
            .unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(applies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_unit_skips_client_construction() {
        let connects = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            connects: Arc::clone(&connects),
            applies: Arc::new(AtomicUsize::new(0)),
        };

        apply_mutations_for_partition(&sink, Vec::new())
            .await
            .unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }
}
