//! Summary of the call edges removed by cycle elimination.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Callers cut loose from one callee. Most callees lose one or two.
type RemovedCallers<R> = SmallVec<[R; 2]>;

/// Immutable record of the call edges removed by [`break_cycles`].
///
/// Maps each callee routine to the callers whose call edges into it were
/// removed. Callees and callers are kept in first-removal order, so two
/// runs over the same graph produce identical results.
///
/// Removed field-read edges are not recorded: they are ordering hints
/// rather than semantic dependencies.
///
/// [`break_cycles`]: crate::break_cycles
#[derive(Clone, Debug)]
pub struct EliminationResult<R> {
    entries: Vec<(R, RemovedCallers<R>)>,
    /// Position of each callee in `entries`.
    index: FxHashMap<R, usize>,
}

// `index` is derived from `entries`, so equality only looks at the latter.
impl<R: PartialEq> PartialEq for EliminationResult<R> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<R: Eq> Eq for EliminationResult<R> {}

impl<R: Copy + Eq + Hash> EliminationResult<R> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Record that the call edge `caller → callee` was removed.
    ///
    /// Returns `false` if the edge was already recorded.
    pub(crate) fn record(&mut self, caller: R, callee: R) -> bool {
        let slot = match self.index.get(&callee) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.entries.push((callee, SmallVec::new()));
                self.index.insert(callee, slot);
                slot
            }
        };
        let callers = &mut self.entries[slot].1;
        if callers.contains(&caller) {
            return false;
        }
        callers.push(caller);
        true
    }

    /// Total number of removed call edges.
    pub fn number_of_removed_call_edges(&self) -> usize {
        self.entries.iter().map(|(_, callers)| callers.len()).sum()
    }

    /// Returns `true` if no call edge was removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callers whose call edge into `callee` was removed.
    pub fn removed_callers(&self, callee: &R) -> &[R] {
        match self.index.get(callee) {
            Some(&slot) => &self.entries[slot].1,
            None => &[],
        }
    }

    /// Returns `true` if the call edge `caller → callee` was removed.
    pub fn is_removed(&self, caller: &R, callee: &R) -> bool {
        self.removed_callers(callee).contains(caller)
    }

    /// Callees that lost at least one caller, in first-removal order.
    pub fn callees(&self) -> impl Iterator<Item = R> + '_ {
        self.entries.iter().map(|(callee, _)| *callee)
    }

    /// Iterate `(callee, removed callers)` pairs in first-removal order.
    pub fn iter(&self) -> impl Iterator<Item = (R, &[R])> + '_ {
        self.entries
            .iter()
            .map(|(callee, callers)| (*callee, callers.as_slice()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests;
