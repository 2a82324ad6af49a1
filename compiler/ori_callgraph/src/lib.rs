//! Call graph cycle elimination for the Ori optimizer.
//!
//! Interprocedural optimizations (inlining, constant and field value
//! propagation) process routines **bottom-up**: a callee's summary must
//! exist before its callers are analyzed. This crate turns a cyclic call
//! graph into one that admits such an order.
//!
//! - **Node contract** ([`DependencyGraph`]): the queries and the two edge
//!   removal primitives the eliminator needs from a graph of routines.
//!
//! - **Cycle elimination** ([`break_cycles`], [`CycleEliminator`]): an
//!   iterative DFS that cuts one edge per detected cycle following a fixed
//!   priority list (field reads, type initializer calls, ordinary calls,
//!   and finally any edge not into a force-inline target), repeated until
//!   no cycle is left. Returns an [`EliminationResult`] listing the removed
//!   call edges.
//!
//! - **Reference graph** ([`CallGraph`]): an arena implementation of the
//!   node contract, plus [`bottom_up_waves`] to derive the processing order
//!   once the graph is acyclic.
//!
//! # Determinism
//!
//! Cycle breaking is reproducible: the same graph always loses the same
//! edges, so optimization output is stable across compiler invocations.
//!
//! # Crate Dependencies
//!
//! `ori_callgraph` has no `ori_*` dependencies. Graph construction (who
//! calls whom, which fields each routine reads and writes, which routines
//! must be force-inlined) is the caller's job.

mod cycles;
mod error;
pub mod graph;
mod node;
mod result;
pub mod schedule;

#[cfg(test)]
mod test_helpers;

pub use cycles::{break_cycles, CycleEliminator};
pub use error::{CycleError, CYCLIC_FORCE_INLINING_MESSAGE};
pub use graph::{CallGraph, RoutineId, RoutineInfo, RoutineKind};
pub use node::DependencyGraph;
pub use result::EliminationResult;
pub use schedule::bottom_up_waves;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times, and a no-op if the host already installed a
/// global subscriber. Enable with `RUST_LOG=ori_callgraph=debug` (one line
/// per cut edge) or `RUST_LOG=ori_callgraph=trace` (adds pass boundaries).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
