use pretty_assertions::assert_eq;

use super::*;

#[test]
fn ids_are_allocated_sequentially() {
    let mut graph = CallGraph::new();
    assert!(graph.is_empty());
    let a = graph.add_routine(RoutineInfo::method("A.a"));
    let b = graph.add_routine(RoutineInfo::type_initializer("B.<clinit>"));
    assert_eq!(a, RoutineId::new(0));
    assert_eq!(b.raw(), 1);
    assert_eq!(b.index(), 1);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.routine(b).kind, RoutineKind::TypeInitializer);
}

#[test]
fn routine_ids_cover_every_routine_in_order() {
    let mut graph = CallGraph::new();
    assert_eq!(graph.routine_ids().count(), 0);
    let a = graph.add_routine(RoutineInfo::method("A.a"));
    let b = graph.add_routine(RoutineInfo::method("B.b"));
    let c = graph.add_routine(RoutineInfo::method("C.c"));
    assert_eq!(graph.routine_ids().collect::<Vec<_>>(), vec![a, b, c]);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn foreign_routine_id_panics() {
    let mut graph = CallGraph::new();
    graph.add_routine(RoutineInfo::method("A.a"));
    let _ = graph.routine(RoutineId::new(1));
}

/// Both endpoints see every edge; duplicates collapse.
#[test]
fn edges_are_symmetric() {
    let mut graph = CallGraph::new();
    let a = graph.add_routine(RoutineInfo::method("A.a"));
    let b = graph.add_routine(RoutineInfo::method("B.b"));
    graph.add_call_edge(a, b);
    graph.add_call_edge(a, b);
    graph.add_field_read_edge(b, a);

    assert!(graph.has_callee(a, b));
    assert!(graph.has_caller(b, a));
    assert!(graph.has_writer(b, a));
    assert!(graph.has_reader(a, b));
    assert_eq!(graph.call_edge_count(), 1);
    assert_eq!(graph.field_read_edge_count(), 1);

    graph.remove_caller(b, a);
    assert!(!graph.has_callee(a, b));
    assert!(!graph.has_caller(b, a));

    graph.remove_reader(a, b);
    assert!(!graph.has_writer(b, a));
    assert!(!graph.has_reader(a, b));
    assert_eq!(graph.call_edge_count(), 0);
    assert_eq!(graph.field_read_edge_count(), 0);
}

#[test]
fn removing_missing_edge_reports_false() {
    let mut graph = CallGraph::new();
    let a = graph.add_routine(RoutineInfo::method("A.a"));
    let b = graph.add_routine(RoutineInfo::method("B.b"));
    assert!(!graph.remove_call_edge(a, b));
    assert!(!graph.remove_field_read_edge(a, b));
    graph.add_call_edge(a, b);
    assert!(graph.remove_call_edge(a, b));
}

/// Successors are ordered by name, not by insertion or hash order.
#[test]
fn successors_sorted_by_name_then_id() {
    let mut graph = CallGraph::new();
    let caller = graph.add_routine(RoutineInfo::method("Main.main"));
    let z = graph.add_routine(RoutineInfo::method("Z.z"));
    let a = graph.add_routine(RoutineInfo::method("A.a"));
    let dup1 = graph.add_routine(RoutineInfo::method("M.m"));
    let dup2 = graph.add_routine(RoutineInfo::method("M.m"));
    for callee in [z, dup2, a, dup1] {
        graph.add_call_edge(caller, callee);
        graph.add_field_read_edge(caller, callee);
    }

    assert_eq!(graph.ordered_callees(caller), vec![a, dup1, dup2, z]);
    assert_eq!(graph.ordered_writers(caller), vec![a, dup1, dup2, z]);
    assert_eq!(graph.callers(z), vec![caller]);
    assert_eq!(graph.readers(a), vec![caller]);
}

#[test]
fn self_loop_is_an_ordinary_edge() {
    let mut graph = CallGraph::new();
    let m = graph.add_routine(RoutineInfo::method("M.m"));
    graph.add_call_edge(m, m);
    assert!(graph.has_callee(m, m));
    assert!(graph.has_caller(m, m));
    assert_eq!(graph.callees(m), vec![m]);
}

#[test]
fn roots_are_routines_without_callers() {
    let mut graph = CallGraph::new();
    let main = graph.add_routine(RoutineInfo::method("Main.main"));
    let helper = graph.add_routine(RoutineInfo::method("Util.helper"));
    let unused = graph.add_routine(RoutineInfo::method("Util.unused"));
    graph.add_call_edge(main, helper);
    // Field reads do not make a routine a callee.
    graph.add_field_read_edge(unused, main);

    assert_eq!(graph.roots(), vec![main, unused]);
}

#[test]
fn routine_predicates_follow_info() {
    let mut graph = CallGraph::new();
    let clinit = graph.add_routine(RoutineInfo::type_initializer("T.<clinit>"));
    let inline = graph.add_routine(RoutineInfo::method("T.get").force_inlined());

    assert!(graph.is_type_initializer(clinit));
    assert!(!graph.is_force_inline_target(clinit));
    assert!(!graph.is_type_initializer(inline));
    assert!(graph.is_force_inline_target(inline));
    assert_eq!(DependencyGraph::routine(&graph, inline), inline);
}
