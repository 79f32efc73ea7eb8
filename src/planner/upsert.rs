//! Upsert planner: last-write-wins merge against existing sink state

use super::KeyPlanner;
use crate::error::{PipelineError, PipelineResult};
use crate::mutation::{MutationType, PlannedRow};
use crate::row::Row;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Key-scoped planner that emits at most one `Upsert` per key.
///
/// Conflict policy for multiple arriving rows on one key: last-write-wins.
/// When an ordering field is configured the arriving row with the greatest
/// value of that field wins, with later arrival order breaking ties;
/// otherwise the last row in arrival order wins.
///
/// The winner is compared field-for-field against the existing rows for the
/// key; when it matches one exactly, nothing is emitted, so an unchanged
/// existing row is never re-written.
#[derive(Debug, Default, Clone)]
pub struct UpsertPlanner {
    ordering_field: Option<String>,
}

impl UpsertPlanner {
    pub fn new() -> Self {
        Self {
            ordering_field: None,
        }
    }

    /// Resolve arriving-row conflicts by the greatest value of this field
    pub fn with_ordering_field(field: impl Into<String>) -> Self {
        Self {
            ordering_field: Some(field.into()),
        }
    }

    fn winner<'a>(&self, arriving: &'a [Row]) -> PipelineResult<&'a Row> {
        let field = match &self.ordering_field {
            None => return Ok(arriving.last().expect("arriving rows are never empty")),
            Some(field) => field,
        };

        let mut winner = &arriving[0];
        for candidate in &arriving[1..] {
            let a = candidate.value(field).ok_or_else(|| {
                PipelineError::planning(format!(
                    "ordering field '{}' not present in arriving row",
                    field
                ))
            })?;
            let b = winner.value(field).ok_or_else(|| {
                PipelineError::planning(format!(
                    "ordering field '{}' not present in arriving row",
                    field
                ))
            })?;

            match a.try_compare(b) {
                Some(Ordering::Greater) | Some(Ordering::Equal) => winner = candidate,
                Some(Ordering::Less) => {}
                None => {
                    return Err(PipelineError::planning(format!(
                        "ordering field '{}' holds values that cannot be compared",
                        field
                    )))
                }
            }
        }

        Ok(winner)
    }

    /// Whether the arriving row matches an existing row on every field the
    /// arriving row carries
    fn matches_existing(arrived: &Row, existing: &Row) -> bool {
        arrived.schema().fields().iter().all(|field| {
            match (arrived.value(&field.name), existing.value(&field.name)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })
    }
}

impl KeyPlanner for UpsertPlanner {
    fn plan_mutations_for_key(
        &self,
        _key: &Row,
        arriving: &[Row],
        existing: &[Row],
    ) -> PipelineResult<Vec<PlannedRow>> {
        if arriving.is_empty() {
            return Ok(Vec::new());
        }

        let winner = self.winner(arriving)?;

        if existing.iter().any(|e| Self::matches_existing(winner, e)) {
            return Ok(Vec::new());
        }

        Ok(vec![PlannedRow::new(MutationType::Upsert, winner.clone())])
    }

    fn emitted_mutation_types(&self) -> HashSet<MutationType> {
        HashSet::from([MutationType::Upsert])
    }
}
