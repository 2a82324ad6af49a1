use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_result_reports_nothing() {
    let result: EliminationResult<u32> = EliminationResult::new();
    assert!(result.is_empty());
    assert_eq!(result.number_of_removed_call_edges(), 0);
    assert!(result.removed_callers(&7).is_empty());
    assert_eq!(result.iter().count(), 0);
}

/// Callers are grouped per callee; the total counts edges, not callees.
#[test]
fn counts_edges_across_callees() {
    let mut result = EliminationResult::new();
    assert!(result.record(1_u32, 2));
    assert!(result.record(3, 2));
    assert!(result.record(2, 1));

    assert_eq!(result.number_of_removed_call_edges(), 3);
    assert_eq!(result.removed_callers(&2), &[1, 3]);
    assert_eq!(result.removed_callers(&1), &[2]);
    assert!(result.is_removed(&3, &2));
    assert!(!result.is_removed(&2, &3));
}

#[test]
fn duplicate_records_are_ignored() {
    let mut result = EliminationResult::new();
    assert!(result.record(1_u32, 2));
    assert!(!result.record(1, 2));
    assert_eq!(result.number_of_removed_call_edges(), 1);
}

#[test]
fn iteration_follows_first_removal_order() {
    let mut result = EliminationResult::new();
    result.record(10_u32, 5);
    result.record(11, 9);
    result.record(12, 5);
    result.record(13, 1);

    assert_eq!(result.callees().collect::<Vec<_>>(), vec![5, 9, 1]);
    let pairs: Vec<(u32, Vec<u32>)> = result
        .iter()
        .map(|(callee, callers)| (callee, callers.to_vec()))
        .collect();
    assert_eq!(
        pairs,
        vec![(5, vec![10, 12]), (9, vec![11]), (1, vec![13])]
    );
}
