//! Derivation seam: components producing a batch from upstream step outputs

use crate::batch::Batch;
use crate::error::{PipelineError, PipelineResult};
use std::collections::HashMap;

/// Derives the arriving batch of a step from the batches of the steps it
/// depends on. Implementations run before the planning engine and must not
/// touch the sink.
pub trait Deriver: Send + Sync {
    fn derive(&self, dependencies: &HashMap<String, Batch>) -> PipelineResult<Batch>;
}

/// Unions all dependency batches into one, requiring at least one dependency
/// and a common schema.
#[derive(Debug, Default, Clone)]
pub struct PassthroughDeriver;

impl PassthroughDeriver {
    pub fn new() -> Self {
        Self
    }
}

impl Deriver for PassthroughDeriver {
    fn derive(&self, dependencies: &HashMap<String, Batch>) -> PipelineResult<Batch> {
        let mut batches = dependencies.values();

        let first = batches
            .next()
            .ok_or_else(|| {
                PipelineError::config("passthrough deriver requires at least one dependency")
            })?
            .clone();

        batches.try_fold(first, |unioned, batch| unioned.union(batch.clone()))
    }
}
