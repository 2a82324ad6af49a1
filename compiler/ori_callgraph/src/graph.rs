//! Arena-backed call graph with field-read dependencies.
//!
//! [`CallGraph`] is the reference [`DependencyGraph`] implementation. Each
//! routine lives in a `Vec` slot addressed by a [`RoutineId`]; every edge is
//! stored on both endpoints (callee/caller, writer/reader) so membership
//! tests are O(1) and removals keep the two sides consistent.
//!
//! Successor order handed to the eliminator is sorted by routine name, then
//! by id, so that cycle breaking never depends on hash iteration order.

use rustc_hash::FxHashSet;

use crate::error::CycleError;
use crate::node::DependencyGraph;
use crate::result::EliminationResult;

// ── ID newtype ──────────────────────────────────────────────────────

/// Routine ID within a [`CallGraph`].
///
/// IDs are allocated sequentially starting from 0, in the order routines
/// were added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct RoutineId(u32);

impl RoutineId {
    /// Create a new routine ID from a raw index.
    ///
    /// The ID is only meaningful for a [`CallGraph`] holding more than `raw`
    /// routines; graph queries panic on out-of-range IDs.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Routine descriptions ────────────────────────────────────────────

/// What kind of routine a node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutineKind {
    /// An ordinary method.
    Method,
    /// The implicit once-per-type initializer.
    TypeInitializer,
}

/// Description of one routine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutineInfo {
    /// Fully qualified name. Also the deterministic sort key for successors.
    pub name: String,
    pub kind: RoutineKind,
    /// The routine must be inlined into every caller.
    pub force_inline: bool,
}

impl RoutineInfo {
    /// An ordinary method that is not force-inlined.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RoutineKind::Method,
            force_inline: false,
        }
    }

    /// A type initializer.
    pub fn type_initializer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RoutineKind::TypeInitializer,
            force_inline: false,
        }
    }

    /// Mark this routine as a force-inline target.
    #[must_use]
    pub fn force_inlined(mut self) -> Self {
        self.force_inline = true;
        self
    }

    pub fn is_type_initializer(&self) -> bool {
        self.kind == RoutineKind::TypeInitializer
    }
}

// ── Graph ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct RoutineNode {
    info: RoutineInfo,
    callees: FxHashSet<RoutineId>,
    callers: FxHashSet<RoutineId>,
    /// Routines writing fields this routine reads.
    writers: FxHashSet<RoutineId>,
    /// Routines reading fields this routine writes.
    readers: FxHashSet<RoutineId>,
}

impl RoutineNode {
    fn new(info: RoutineInfo) -> Self {
        Self {
            info,
            callees: FxHashSet::default(),
            callers: FxHashSet::default(),
            writers: FxHashSet::default(),
            readers: FxHashSet::default(),
        }
    }
}

/// Whole-program call graph with field-read dependencies.
///
/// # Panics
///
/// Every method taking a [`RoutineId`] panics if the ID was not returned by
/// [`CallGraph::add_routine`] on this graph.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    nodes: Vec<RoutineNode>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a routine and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the graph already holds `u32::MAX` routines.
    pub fn add_routine(&mut self, info: RoutineInfo) -> RoutineId {
        let raw = u32::try_from(self.nodes.len()).unwrap_or_else(|_| {
            panic!("call graph routine count exceeds u32::MAX");
        });
        self.nodes.push(RoutineNode::new(info));
        RoutineId::new(raw)
    }

    /// Add the call edge `caller → callee`. Duplicate edges collapse.
    pub fn add_call_edge(&mut self, caller: RoutineId, callee: RoutineId) {
        self.nodes[caller.index()].callees.insert(callee);
        self.nodes[callee.index()].callers.insert(caller);
    }

    /// Add the field-read edge `reader → writer`: `reader` reads a field
    /// that `writer` stores to. Duplicate edges collapse.
    pub fn add_field_read_edge(&mut self, reader: RoutineId, writer: RoutineId) {
        self.nodes[reader.index()].writers.insert(writer);
        self.nodes[writer.index()].readers.insert(reader);
    }

    /// Remove the call edge `caller → callee` from both endpoints.
    ///
    /// Returns `true` if the edge existed.
    pub fn remove_call_edge(&mut self, caller: RoutineId, callee: RoutineId) -> bool {
        let removed = self.nodes[caller.index()].callees.remove(&callee);
        self.nodes[callee.index()].callers.remove(&caller);
        removed
    }

    /// Remove the field-read edge `reader → writer` from both endpoints.
    ///
    /// Returns `true` if the edge existed.
    pub fn remove_field_read_edge(&mut self, reader: RoutineId, writer: RoutineId) -> bool {
        let removed = self.nodes[reader.index()].writers.remove(&writer);
        self.nodes[writer.index()].readers.remove(&reader);
        removed
    }

    pub fn routine(&self, id: RoutineId) -> &RoutineInfo {
        &self.nodes[id.index()].info
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All routine IDs in allocation order.
    pub fn routine_ids(&self) -> impl Iterator<Item = RoutineId> + '_ {
        (0_u32..).zip(&self.nodes).map(|(raw, _)| RoutineId::new(raw))
    }

    /// Callees of `id`, in deterministic order.
    pub fn callees(&self, id: RoutineId) -> Vec<RoutineId> {
        self.sorted(&self.nodes[id.index()].callees)
    }

    /// Callers of `id`, in deterministic order.
    pub fn callers(&self, id: RoutineId) -> Vec<RoutineId> {
        self.sorted(&self.nodes[id.index()].callers)
    }

    /// Writers `id` depends on, in deterministic order.
    pub fn writers(&self, id: RoutineId) -> Vec<RoutineId> {
        self.sorted(&self.nodes[id.index()].writers)
    }

    /// Readers depending on `id`, in deterministic order.
    pub fn readers(&self, id: RoutineId) -> Vec<RoutineId> {
        self.sorted(&self.nodes[id.index()].readers)
    }

    pub fn has_call_edge(&self, caller: RoutineId, callee: RoutineId) -> bool {
        self.nodes[caller.index()].callees.contains(&callee)
    }

    pub fn has_field_read_edge(&self, reader: RoutineId, writer: RoutineId) -> bool {
        self.nodes[reader.index()].writers.contains(&writer)
    }

    /// Total number of call edges.
    pub fn call_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.callees.len()).sum()
    }

    /// Total number of field-read edges.
    pub fn field_read_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.writers.len()).sum()
    }

    /// Routines nobody calls, in ID order.
    pub fn roots(&self) -> Vec<RoutineId> {
        self.routine_ids()
            .filter(|id| self.nodes[id.index()].callers.is_empty())
            .collect()
    }

    /// Break every cycle in the graph, using all routines as roots.
    pub fn break_cycles(
        &mut self,
    ) -> Result<EliminationResult<RoutineId>, CycleError<RoutineId>> {
        let roots: Vec<RoutineId> = self.routine_ids().collect();
        crate::break_cycles(self, roots)
    }

    /// Sort a successor set by routine name, then by ID.
    fn sorted(&self, set: &FxHashSet<RoutineId>) -> Vec<RoutineId> {
        let mut ids: Vec<RoutineId> = set.iter().copied().collect();
        ids.sort_by(|a, b| {
            self.nodes[a.index()]
                .info
                .name
                .cmp(&self.nodes[b.index()].info.name)
                .then(a.cmp(b))
        });
        ids
    }
}

impl DependencyGraph for CallGraph {
    type Node = RoutineId;
    type Routine = RoutineId;

    fn routine(&self, node: RoutineId) -> RoutineId {
        node
    }

    fn is_type_initializer(&self, node: RoutineId) -> bool {
        self.nodes[node.index()].info.is_type_initializer()
    }

    fn is_force_inline_target(&self, node: RoutineId) -> bool {
        self.nodes[node.index()].info.force_inline
    }

    fn ordered_callees(&self, node: RoutineId) -> Vec<RoutineId> {
        self.callees(node)
    }

    fn ordered_writers(&self, node: RoutineId) -> Vec<RoutineId> {
        self.writers(node)
    }

    fn has_caller(&self, node: RoutineId, caller: RoutineId) -> bool {
        self.nodes[node.index()].callers.contains(&caller)
    }

    fn has_callee(&self, node: RoutineId, callee: RoutineId) -> bool {
        self.nodes[node.index()].callees.contains(&callee)
    }

    fn has_writer(&self, node: RoutineId, writer: RoutineId) -> bool {
        self.nodes[node.index()].writers.contains(&writer)
    }

    fn has_reader(&self, node: RoutineId, reader: RoutineId) -> bool {
        self.nodes[node.index()].readers.contains(&reader)
    }

    fn remove_caller(&mut self, node: RoutineId, caller: RoutineId) {
        self.remove_call_edge(caller, node);
    }

    fn remove_reader(&mut self, node: RoutineId, reader: RoutineId) {
        self.remove_field_read_edge(reader, node);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests;
