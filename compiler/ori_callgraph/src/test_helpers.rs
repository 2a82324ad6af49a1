//! Shared test utilities for call graph tests.
//!
//! Only compiled in test builds.

use crate::graph::{CallGraph, RoutineId, RoutineInfo};
use crate::schedule::bottom_up_waves;

/// Add an ordinary method named `name`.
pub(crate) fn method(graph: &mut CallGraph, name: &str) -> RoutineId {
    graph.add_routine(RoutineInfo::method(name))
}

/// Add a type initializer named `name`.
pub(crate) fn clinit(graph: &mut CallGraph, name: &str) -> RoutineId {
    graph.add_routine(RoutineInfo::type_initializer(name))
}

/// Add a force-inline method named `name`.
pub(crate) fn force_inline(graph: &mut CallGraph, name: &str) -> RoutineId {
    graph.add_routine(RoutineInfo::method(name).force_inlined())
}

/// Add a call edge for each `(caller, callee)` pair.
pub(crate) fn calls(graph: &mut CallGraph, edges: &[(RoutineId, RoutineId)]) {
    for &(caller, callee) in edges {
        graph.add_call_edge(caller, callee);
    }
}

/// Returns `true` if no cycle of call or field-read edges remains.
pub(crate) fn is_acyclic(graph: &CallGraph) -> bool {
    bottom_up_waves(graph).is_ok()
}
