//! Existing-state join: attach persisted rows to arriving key groups
//!
//! Grouping is hash-based; no global sort is performed and order within a
//! key group carries no meaning. Each processing unit constructs at most one
//! lookup client, lazily, and issues a single `existing_for_keys` call over
//! the unit's full distinct key set — one lookup per key would be a
//! performance violation, which is why the sink interface takes a key set.

use crate::error::PipelineResult;
use crate::key::KeyExtractor;
use crate::row::Row;
use crate::sink::KeyedSink;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One key observed in a unit, with its arriving and existing rows.
/// An empty existing set is valid: it is the pure create case.
#[derive(Debug, Clone)]
pub struct KeyedRecords {
    pub key: Row,
    pub arriving: Vec<Row>,
    pub existing: Vec<Row>,
}

/// Group rows by their extracted key. Rows within a group keep arrival
/// order, but correctness must not depend on it.
pub fn group_by_key(
    rows: Vec<Row>,
    extractor: &KeyExtractor,
) -> PipelineResult<HashMap<Row, Vec<Row>>> {
    let mut groups: HashMap<Row, Vec<Row>> = HashMap::new();

    for row in rows {
        let key = extractor.extract(&row)?;
        groups.entry(key).or_default().push(row);
    }

    Ok(groups)
}

/// Join the existing sink state onto the arriving key groups of one unit.
///
/// Returns without constructing a client when the unit holds no groups.
/// Rows the sink returns for keys outside the requested set are dropped with
/// a warning; the client is released when this call returns, on every path.
pub async fn join_existing_for_partition(
    groups: Vec<(Row, Vec<Row>)>,
    sink: &dyn KeyedSink,
    extractor: &KeyExtractor,
) -> PipelineResult<Vec<KeyedRecords>> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let mut client = sink.connect().await?;

    let distinct_keys: HashSet<Row> = groups.iter().map(|(key, _)| key.clone()).collect();
    debug!(
        "looking up existing rows for {} distinct keys",
        distinct_keys.len()
    );

    let existing_rows = client.existing_for_keys(&distinct_keys).await?;

    // Map each returned row back to the key it was looked up from
    let mut existing_for_keys: HashMap<Row, Vec<Row>> = HashMap::new();
    for existing in existing_rows {
        let key = extractor.extract(&existing)?;

        if !distinct_keys.contains(&key) {
            warn!("sink returned a row outside the requested key set; dropping it");
            continue;
        }

        existing_for_keys.entry(key).or_default().push(existing);
    }

    let joined = groups
        .into_iter()
        .map(|(key, arriving)| {
            let existing = existing_for_keys.remove(&key).unwrap_or_default();
            KeyedRecords {
                key,
                arriving,
                existing,
            }
        })
        .collect();

    Ok(joined)
}
