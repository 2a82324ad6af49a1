//! Bottom-up processing order over an acyclic call graph.
//!
//! Once cycles are broken, routines can be processed in *waves*: the first
//! wave holds the leaves (no callees, no writers), and each later wave holds
//! routines whose callees and writers all appeared in earlier waves. All
//! routines of one wave are independent of each other.

use crate::error::CycleError;
use crate::graph::{CallGraph, RoutineId};

/// Partition every routine of `graph` into bottom-up waves.
///
/// Routines within a wave are in ID order. Fails with
/// [`CycleError::UnbrokenCycle`] if some routines lie on, or depend on, a
/// cycle of call or field-read edges.
pub fn bottom_up_waves(graph: &CallGraph) -> Result<Vec<Vec<RoutineId>>, CycleError<RoutineId>> {
    // Outstanding dependencies per routine. Self-loops count, so a routine
    // that still calls itself never becomes a leaf.
    let mut pending: Vec<usize> = graph
        .routine_ids()
        .map(|id| graph.callees(id).len() + graph.writers(id).len())
        .collect();

    let mut wave: Vec<RoutineId> = graph
        .routine_ids()
        .filter(|id| pending[id.index()] == 0)
        .collect();
    let mut waves = Vec::new();
    let mut scheduled = 0;

    while !wave.is_empty() {
        scheduled += wave.len();
        let mut next = Vec::new();
        for &leaf in &wave {
            for dependent in graph.callers(leaf).into_iter().chain(graph.readers(leaf)) {
                let count = &mut pending[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    next.push(dependent);
                }
            }
        }
        next.sort_unstable();
        waves.push(std::mem::replace(&mut wave, next));
    }

    if scheduled < graph.len() {
        let remaining: Vec<RoutineId> = graph
            .routine_ids()
            .filter(|id| pending[id.index()] > 0)
            .collect();
        tracing::debug!(
            remaining = remaining.len(),
            "call graph cycle blocks bottom-up scheduling"
        );
        return Err(CycleError::UnbrokenCycle { remaining });
    }

    Ok(waves)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
