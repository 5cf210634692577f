//! Report generation: filter the task universe, fold the calculators.

pub mod calc;
pub mod filter;

use crate::error::ReportError;
use crate::types::{ReportAggregate, ReportParameters, TaskSnapshot};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Build the report aggregate for `params` over a universe snapshot.
///
/// Pure apart from the generated id and timestamp: identical parameters and
/// universe produce identical statistics. An empty selection is an error,
/// never an aggregate with `total == 0`.
pub fn generate(
    params: &ReportParameters,
    universe: &[TaskSnapshot],
    now: i64,
) -> Result<ReportAggregate, ReportError> {
    if params.from > params.to {
        return Err(ReportError::InvalidDateRange);
    }

    let selected: Vec<TaskSnapshot> = universe
        .iter()
        .filter(|snapshot| filter::selects(snapshot, params))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(ReportError::EmptyResultSet);
    }

    let mut aggregate = ReportAggregate {
        id: Uuid::now_v7().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        parameters: params.clone(),
        tasks: selected.iter().map(|s| s.task.clone()).collect(),
        counts_by_status: BTreeMap::new(),
        total: 0,
        percent_done: 0.0,
        done_on_time: 0,
        overdue_count: 0,
        total_elapsed_ms: 0,
        average_elapsed_ms: 0,
    };

    for calculator in calc::CALCULATORS {
        calculator(&selected, now, &mut aggregate);
    }

    Ok(aggregate)
}
