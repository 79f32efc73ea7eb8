//! Startup-time compatibility check between planner and sink
//!
//! Runs once at step construction, before any row flows; there is no per-row
//! or per-unit re-validation.

use crate::error::{PipelineError, PipelineResult};
use crate::planner::Planner;
use crate::sink::Sink;

/// Verify that the planner and sink shapes match and that every mutation
/// type the planner may emit is supported by the sink. Failures name both
/// components.
pub fn validate_compatibility(
    planner: &Planner,
    sink: &Sink,
    planner_name: &str,
    sink_name: &str,
) -> PipelineResult<()> {
    match (planner, sink) {
        (Planner::Keyed(_), Sink::Keyed(_)) | (Planner::Bulk(_), Sink::Bulk(_)) => {}
        _ => {
            return Err(PipelineError::config(format!(
                "planner '{}' is {} but sink '{}' is {}",
                planner_name,
                planner.shape(),
                sink_name,
                sink.shape()
            )))
        }
    }

    let emitted = planner.emitted_mutation_types();
    let supported = sink.supported_mutation_types();

    let mut unsupported: Vec<String> = emitted
        .difference(&supported)
        .map(|m| m.to_string())
        .collect();
    unsupported.sort();

    if !unsupported.is_empty() {
        return Err(PipelineError::config(format!(
            "planner '{}' emits mutation types [{}] not supported by sink '{}'",
            planner_name,
            unsupported.join(", "),
            sink_name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationType;
    use crate::planner::{AppendPlanner, BulkInsertPlanner, UpsertPlanner};
    use crate::sink::MemorySink;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn keyed_sink() -> Sink {
        MemorySink::new(vec!["id".to_string()]).into_keyed()
    }

    #[test]
    fn test_compatible_pair_passes() {
        let planner = Planner::Keyed(Arc::new(UpsertPlanner::new()));
        assert!(validate_compatibility(&planner, &keyed_sink(), "upsert", "memory").is_ok());
    }

    #[test]
    fn test_shape_mismatch_fails_naming_both() {
        let planner = Planner::Bulk(Arc::new(BulkInsertPlanner::new()));
        let err =
            validate_compatibility(&planner, &keyed_sink(), "bulk_insert", "memory").unwrap_err();

        assert!(err.is_configuration());
        let message = err.to_string();
        assert!(message.contains("bulk_insert"));
        assert!(message.contains("memory"));
        assert!(message.contains("set-scoped"));
    }

    #[test]
    fn test_unsupported_mutation_type_fails() {
        use crate::error::PipelineResult;
        use crate::mutation::PlannedRow;
        use crate::planner::KeyPlanner;
        use crate::row::Row;

        // Planner declaring a type the insert-only sink below cannot apply
        struct DeleteOnlyPlanner;

        impl KeyPlanner for DeleteOnlyPlanner {
            fn plan_mutations_for_key(
                &self,
                _key: &Row,
                _arriving: &[Row],
                _existing: &[Row],
            ) -> PipelineResult<Vec<PlannedRow>> {
                Ok(Vec::new())
            }

            fn emitted_mutation_types(&self) -> HashSet<MutationType> {
                HashSet::from([MutationType::Delete, MutationType::Insert])
            }
        }

        use crate::sink::{KeyedSink, KeyedSinkClient};
        use async_trait::async_trait;

        struct InsertOnlySink;

        #[async_trait]
        impl KeyedSink for InsertOnlySink {
            fn supported_mutation_types(&self) -> HashSet<MutationType> {
                HashSet::from([MutationType::Insert])
            }

            async fn connect(&self) -> PipelineResult<Box<dyn KeyedSinkClient>> {
                Err(crate::error::PipelineError::sink("not used in this test"))
            }
        }

        let planner = Planner::Keyed(Arc::new(DeleteOnlyPlanner));
        let sink = Sink::Keyed(Arc::new(InsertOnlySink));

        let err = validate_compatibility(&planner, &sink, "delete_only", "insert_only")
            .unwrap_err();

        assert!(err.is_configuration());
        let message = err.to_string();
        assert!(message.contains("delete"));
        assert!(message.contains("insert_only"));
    }

    #[test]
    fn test_append_into_full_sink_passes() {
        let planner = Planner::Keyed(Arc::new(AppendPlanner::new()));
        assert!(validate_compatibility(&planner, &keyed_sink(), "append", "memory").is_ok());
    }
}
