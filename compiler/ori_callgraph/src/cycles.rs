//! Call graph cycle elimination.
//!
//! Bottom-up interprocedural optimization (inlining, constant and field
//! value propagation) needs every callee summarized before its callers.
//! Recursion makes the call graph cyclic, so this pass cuts edges until the
//! graph reachable from the roots is acyclic.
//!
//! # Algorithm
//!
//! An iterative depth-first traversal over call and field-read edges. When
//! an edge reaches a node that is still open on the DFS stack, the edge
//! closes a cycle, which is resolved by the first matching rule:
//!
//! 1. The edge is a field-read edge: cut it.
//! 2. The cycle contains a field-read tree edge: cut that one instead.
//! 3. The edge calls a type initializer: cut it.
//! 4. The cycle contains a call into a type initializer: cut that instead.
//! 5. The callee is not a force-inline target: cut the edge.
//! 6. Otherwise scan the whole cycle for an edge that may be cut. If there
//!    is none, the inlining obligations are contradictory and elimination
//!    fails with [`CycleError::CyclicForceInlining`].
//!
//! Cuts are recorded per source node and applied once that node's
//! successors are exhausted, so successor lists never change underneath the
//! traversal.
//!
//! Cutting a tree edge deep in a cycle does not necessarily break every
//! cycle through the cut point, so the targets of such cuts are revisited
//! in a further pass. Passes repeat until one finishes without revisits.
//!
//! # Determinism
//!
//! Successors are visited in the order given by
//! [`DependencyGraph::ordered_callees`] and
//! [`DependencyGraph::ordered_writers`], and the rules above are a fixed
//! priority list, so identical graphs always lose identical edges.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::CycleError;
use crate::node::DependencyGraph;
use crate::result::EliminationResult;

/// Break every cycle in the graph reachable from `roots`.
///
/// Mutates `graph` in place and returns the removed call edges. On error,
/// cuts already applied to `graph` stay applied.
pub fn break_cycles<G, I>(
    graph: &mut G,
    roots: I,
) -> Result<EliminationResult<G::Routine>, CycleError<G::Routine>>
where
    G: DependencyGraph,
    I: IntoIterator<Item = G::Node>,
{
    CycleEliminator::new(graph).break_cycles(roots)
}

/// Which rule cut an edge. Only used for tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CutRule {
    FieldReadBackEdge,
    FieldReadInCycle,
    TypeInitializerCall,
    TypeInitializerCallInCycle,
    CallBackEdge,
    ForceInlineFallback,
}

impl CutRule {
    fn as_str(self) -> &'static str {
        match self {
            CutRule::FieldReadBackEdge => "field-read back edge",
            CutRule::FieldReadInCycle => "field-read edge in cycle",
            CutRule::TypeInitializerCall => "type initializer call",
            CutRule::TypeInitializerCallInCycle => "type initializer call in cycle",
            CutRule::CallBackEdge => "call back edge",
            CutRule::ForceInlineFallback => "force-inline fallback",
        }
    }
}

/// How the traversal reached a successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeKind {
    Call,
    FieldRead,
}

/// An edge between two adjacent nodes of an extracted cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge<N> {
    Call { caller: N, callee: N },
    FieldRead { reader: N, writer: N },
}

/// Bookkeeping for a node on the DFS stack.
#[derive(Clone, Copy, Debug)]
struct StackEntryInfo<N> {
    /// Position on the DFS stack.
    index: usize,
    /// Node whose successor iteration reached this one, and the kind of
    /// that tree edge. `None` for roots.
    predecessor: Option<(N, EdgeKind)>,
    /// The tree edge into this node has already been scheduled for removal.
    processed: bool,
}

enum WorkItem<N> {
    /// Open `node` unless it was fully explored in this pass. `reached_by`
    /// is `None` for roots.
    Visit {
        node: N,
        reached_by: Option<EdgeKind>,
    },
    /// Continue iterating the callees, then writers, of an open node.
    Resume {
        caller_or_reader: N,
        callees_and_writers: Successors<N>,
    },
}

/// Outcome of scanning an extracted cycle for an edge to cut.
enum CycleScan<N> {
    Removable(Edge<N>),
    /// Some edge of the cycle no longer exists.
    AlreadyBroken,
    /// Every edge is a call into a force-inline target.
    Unbreakable,
}

/// Remaining successors of an open node, tagged with the edge kind.
type Successors<N> = std::vec::IntoIter<(N, EdgeKind)>;

/// Deferred removals for one source node.
type PendingTargets<N> = SmallVec<[N; 2]>;

/// Cycle eliminator state for one invocation.
///
/// Everything except the removed call edges is per pass and is cleared
/// before a revisit pass starts.
pub struct CycleEliminator<'g, G: DependencyGraph> {
    graph: &'g mut G,

    /// DFS stack of open nodes.
    stack: Vec<G::Node>,
    /// Entry info for every node on `stack`.
    stack_entry_info: FxHashMap<G::Node, StackEntryInfo<G::Node>>,
    /// Subsequence of `stack` reached by a call into a type initializer.
    clinit_call_stack: Vec<G::Node>,
    /// Subsequence of `stack` reached by a field-read edge.
    writer_stack: Vec<G::Node>,
    /// Nodes whose reachable subgraph has been fully explored.
    marked: FxHashSet<G::Node>,

    /// Call edges to cut once the caller is finished, keyed by caller.
    callees_to_be_removed: FxHashMap<G::Node, PendingTargets<G::Node>>,
    /// Field-read edges to cut once the reader is finished, keyed by reader.
    writers_to_be_removed: FxHashMap<G::Node, PendingTargets<G::Node>>,

    /// Roots of the next pass, in insertion order.
    revisit: Vec<G::Node>,
    revisit_set: FxHashSet<G::Node>,

    removed_call_edges: EliminationResult<G::Routine>,
    removed_field_read_edges: usize,
}

impl<'g, G: DependencyGraph> CycleEliminator<'g, G> {
    /// Create an eliminator that cuts edges of `graph`.
    pub fn new(graph: &'g mut G) -> Self {
        Self {
            graph,
            stack: Vec::new(),
            stack_entry_info: FxHashMap::default(),
            clinit_call_stack: Vec::new(),
            writer_stack: Vec::new(),
            marked: FxHashSet::default(),
            callees_to_be_removed: FxHashMap::default(),
            writers_to_be_removed: FxHashMap::default(),
            revisit: Vec::new(),
            revisit_set: FxHashSet::default(),
            removed_call_edges: EliminationResult::new(),
            removed_field_read_edges: 0,
        }
    }

    /// Break every cycle reachable from `roots`, repeating the traversal
    /// from revisited nodes until a pass leaves nothing to revisit.
    pub fn break_cycles<I>(
        mut self,
        roots: I,
    ) -> Result<EliminationResult<G::Routine>, CycleError<G::Routine>>
    where
        I: IntoIterator<Item = G::Node>,
    {
        let mut roots: Vec<G::Node> = roots.into_iter().collect();
        let mut passes = 0_usize;

        while !roots.is_empty() {
            passes += 1;
            tracing::trace!(pass = passes, roots = roots.len(), "cycle elimination pass");
            self.traverse(&roots)?;
            roots = self.prepare_for_new_traversal();
        }

        let removed_call_edges = self.removed_call_edges.number_of_removed_call_edges();
        if removed_call_edges > 0 || self.removed_field_read_edges > 0 {
            tracing::debug!(
                passes,
                removed_call_edges,
                removed_field_read_edges = self.removed_field_read_edges,
                "broke call graph cycles",
            );
        }

        Ok(self.removed_call_edges)
    }

    /// Clear per-pass state and hand back the nodes to revisit.
    fn prepare_for_new_traversal(&mut self) -> Vec<G::Node> {
        debug_assert!(self.stack.is_empty());
        debug_assert!(self.stack_entry_info.is_empty());
        debug_assert!(self.clinit_call_stack.is_empty());
        debug_assert!(self.writer_stack.is_empty());
        debug_assert!(self.callees_to_be_removed.is_empty());
        debug_assert!(self.writers_to_be_removed.is_empty());
        self.marked.clear();
        self.revisit_set.clear();
        std::mem::take(&mut self.revisit)
    }

    // ── Traversal ───────────────────────────────────────────────────

    fn traverse(&mut self, roots: &[G::Node]) -> Result<(), CycleError<G::Routine>> {
        // The worklist is a stack: roots are pushed in reverse so that they
        // are visited in the given order.
        let mut work_items: Vec<WorkItem<G::Node>> = roots
            .iter()
            .rev()
            .map(|&root| WorkItem::Visit {
                node: root,
                reached_by: None,
            })
            .collect();

        while let Some(work_item) = work_items.pop() {
            match work_item {
                WorkItem::Visit { node, reached_by } => {
                    if self.marked.contains(&node) {
                        continue;
                    }
                    let predecessor = self.stack.last().copied().zip(reached_by);
                    self.push(node, predecessor);

                    let callees = self.graph.ordered_callees(node);
                    let writers = self.graph.ordered_writers(node);
                    let mut callees_and_writers = Vec::with_capacity(callees.len() + writers.len());
                    callees_and_writers.extend(callees.into_iter().map(|n| (n, EdgeKind::Call)));
                    callees_and_writers
                        .extend(writers.into_iter().map(|n| (n, EdgeKind::FieldRead)));
                    work_items.push(WorkItem::Resume {
                        caller_or_reader: node,
                        callees_and_writers: callees_and_writers.into_iter(),
                    });
                }
                WorkItem::Resume {
                    caller_or_reader,
                    mut callees_and_writers,
                } => {
                    let next = self
                        .iterate_callees_and_writers(&mut callees_and_writers, caller_or_reader)?;
                    if let Some((next, kind)) = next {
                        work_items.push(WorkItem::Resume {
                            caller_or_reader,
                            callees_and_writers,
                        });
                        work_items.push(WorkItem::Visit {
                            node: next,
                            reached_by: Some(kind),
                        });
                    } else {
                        self.pop(caller_or_reader);
                        self.marked.insert(caller_or_reader);
                        self.flush_removals(caller_or_reader);
                    }
                }
            }
        }

        Ok(())
    }

    /// Advance `callees_and_writers` past every successor that closes a
    /// cycle, resolving each one. Returns the first successor that is not on
    /// the stack, or `None` once the iterator is exhausted.
    fn iterate_callees_and_writers(
        &mut self,
        callees_and_writers: &mut Successors<G::Node>,
        caller_or_reader: G::Node,
    ) -> Result<Option<(G::Node, EdgeKind)>, CycleError<G::Routine>> {
        for (callee_or_writer, kind) in callees_and_writers {
            let Some(entry) = self.stack_entry_info.get(&callee_or_writer) else {
                return Ok(Some((callee_or_writer, kind)));
            };
            let cycle_entry_index = entry.index;

            // Rule 1: field-read edges are hints and always safe to cut.
            if kind == EdgeKind::FieldRead {
                debug_assert!(self.graph.has_reader(callee_or_writer, caller_or_reader));
                self.remove_field_read_edge(
                    caller_or_reader,
                    callee_or_writer,
                    CutRule::FieldReadBackEdge,
                );
                continue;
            }

            // Rule 2: a call edge, but a field-read edge lies inside this cycle.
            if let Some(&writer) = self.writer_stack.last() {
                if self.remove_incoming_edge_on_stack(
                    writer,
                    cycle_entry_index,
                    CutRule::FieldReadInCycle,
                ) {
                    continue;
                }
            }

            // Rule 3: calls into type initializers are always safe to cut.
            if self.graph.is_type_initializer(callee_or_writer) {
                debug_assert!(self.graph.has_caller(callee_or_writer, caller_or_reader));
                self.remove_call_edge(
                    caller_or_reader,
                    callee_or_writer,
                    CutRule::TypeInitializerCall,
                );
                continue;
            }

            // Rule 4: a call into a type initializer lies inside this cycle.
            if let Some(&clinit) = self.clinit_call_stack.last() {
                if self.remove_incoming_edge_on_stack(
                    clinit,
                    cycle_entry_index,
                    CutRule::TypeInitializerCallInCycle,
                ) {
                    continue;
                }
            }

            // Rule 5: the common case.
            if self.call_edge_removal_is_safe(caller_or_reader, callee_or_writer) {
                self.remove_call_edge(caller_or_reader, callee_or_writer, CutRule::CallBackEdge);
                continue;
            }

            // Rule 6: the edge must be kept for force inlining. Find another
            // edge of the cycle to cut.
            let cycle = self.extract_cycle(cycle_entry_index);
            match self.find_edge_for_removal(&cycle) {
                CycleScan::Removable(Edge::Call { caller, callee }) => {
                    self.remove_call_edge(caller, callee, CutRule::ForceInlineFallback);
                    self.add_revisit(callee);
                }
                CycleScan::Removable(Edge::FieldRead { reader, writer }) => {
                    self.remove_field_read_edge(reader, writer, CutRule::ForceInlineFallback);
                    self.add_revisit(writer);
                }
                CycleScan::AlreadyBroken => {}
                CycleScan::Unbreakable => {
                    let cycle = cycle.iter().map(|&node| self.graph.routine(node)).collect();
                    return Err(CycleError::CyclicForceInlining { cycle });
                }
            }
        }

        Ok(None)
    }

    fn push(&mut self, node: G::Node, predecessor: Option<(G::Node, EdgeKind)>) {
        self.stack.push(node);
        let previous = self.stack_entry_info.insert(
            node,
            StackEntryInfo {
                index: self.stack.len() - 1,
                predecessor,
                processed: false,
            },
        );
        debug_assert!(previous.is_none(), "{node:?} pushed twice");

        match predecessor {
            Some((_, EdgeKind::Call)) if self.graph.is_type_initializer(node) => {
                self.clinit_call_stack.push(node);
            }
            Some((_, EdgeKind::FieldRead)) => self.writer_stack.push(node),
            _ => {}
        }
    }

    fn pop(&mut self, node: G::Node) {
        let popped = self.stack.pop();
        debug_assert_eq!(popped, Some(node));
        let info = self.stack_entry_info.remove(&node);
        debug_assert!(info.is_some());

        if self.clinit_call_stack.last() == Some(&node) {
            debug_assert_ne!(self.writer_stack.last(), Some(&node));
            self.clinit_call_stack.pop();
        } else if self.writer_stack.last() == Some(&node) {
            self.writer_stack.pop();
        }
    }

    /// Apply the cuts recorded for a node whose iteration just finished.
    fn flush_removals(&mut self, source: G::Node) {
        if let Some(callees) = self.callees_to_be_removed.remove(&source) {
            let caller = self.graph.routine(source);
            for callee in callees {
                self.graph.remove_caller(callee, source);
                self.removed_call_edges.record(caller, self.graph.routine(callee));
            }
        }

        if let Some(writers) = self.writers_to_be_removed.remove(&source) {
            for writer in writers {
                self.graph.remove_reader(writer, source);
                self.removed_field_read_edges += 1;
            }
        }
    }

    // ── Cut policy ──────────────────────────────────────────────────

    fn remove_call_edge(&mut self, caller: G::Node, callee: G::Node, rule: CutRule) {
        tracing::debug!(?caller, ?callee, rule = rule.as_str(), "cutting call edge");
        defer(&mut self.callees_to_be_removed, caller, callee);
    }

    fn remove_field_read_edge(&mut self, reader: G::Node, writer: G::Node, rule: CutRule) {
        tracing::debug!(?reader, ?writer, rule = rule.as_str(), "cutting field-read edge");
        defer(&mut self.writers_to_be_removed, reader, writer);
    }

    /// Cut the tree edge into `target` if `target` sits inside the cycle
    /// whose entry is at `cycle_entry_index` on the stack.
    ///
    /// Returns `true` if the cycle is broken, either now or by an earlier
    /// cut of the same tree edge.
    fn remove_incoming_edge_on_stack(
        &mut self,
        target: G::Node,
        cycle_entry_index: usize,
        rule: CutRule,
    ) -> bool {
        let Some(info) = self.stack_entry_info.get_mut(&target) else {
            return false;
        };
        // Entries on the clinit and writer stacks always have a predecessor.
        let Some((predecessor, kind)) = info.predecessor else {
            return false;
        };
        if info.index <= cycle_entry_index {
            return false;
        }
        if info.processed {
            return true;
        }
        info.processed = true;
        debug_assert_eq!(self.stack.get(info.index - 1), Some(&predecessor));

        match kind {
            EdgeKind::FieldRead => self.remove_field_read_edge(predecessor, target, rule),
            EdgeKind::Call => self.remove_call_edge(predecessor, target, rule),
        }
        self.add_revisit(target);
        true
    }

    /// Whether the call edge `caller → callee` may be cut.
    ///
    /// Calls into force-inline targets must be kept so the callee is
    /// processed before the caller.
    fn call_edge_removal_is_safe(&self, caller: G::Node, callee: G::Node) -> bool {
        debug_assert!(self.graph.has_caller(callee, caller));
        !self.graph.is_force_inline_target(callee)
    }

    /// The cycle closed by an edge into the stack entry at
    /// `cycle_entry_index`, innermost node first.
    fn extract_cycle(&self, cycle_entry_index: usize) -> Vec<G::Node> {
        self.stack[cycle_entry_index..].iter().rev().copied().collect()
    }

    /// Pick an edge of `cycle` that may be cut.
    ///
    /// Each node of `cycle` has an edge to its predecessor in the slice; the
    /// last node (the cycle entry) is targeted by the first, which is the
    /// call back edge being resolved. The other edges are DFS tree edges of
    /// the recorded kind. Field-read edges are preferred over call edges;
    /// among call edges the first one whose callee is not a force-inline
    /// target wins.
    fn find_edge_for_removal(&self, cycle: &[G::Node]) -> CycleScan<G::Node> {
        let Some(&entry) = cycle.last() else {
            return CycleScan::AlreadyBroken;
        };
        let mut candidate = None;
        let mut callee = entry;
        let mut kind = EdgeKind::Call;

        for &caller in cycle {
            if kind == EdgeKind::FieldRead {
                if !self.graph.has_writer(caller, callee) {
                    return CycleScan::AlreadyBroken;
                }
                return CycleScan::Removable(Edge::FieldRead {
                    reader: caller,
                    writer: callee,
                });
            }
            if !self.graph.has_callee(caller, callee) {
                return CycleScan::AlreadyBroken;
            }
            if candidate.is_none() && self.call_edge_removal_is_safe(caller, callee) {
                candidate = Some(Edge::Call { caller, callee });
            }
            kind = self.stack_entry_info[&caller]
                .predecessor
                .map_or(EdgeKind::Call, |(_, kind)| kind);
            callee = caller;
        }

        candidate.map_or(CycleScan::Unbreakable, CycleScan::Removable)
    }

    fn add_revisit(&mut self, node: G::Node) {
        if self.revisit_set.insert(node) {
            self.revisit.push(node);
        }
    }
}

/// Record `target` for removal from `source` once `source` is finished.
fn defer<N: Copy + Eq + std::hash::Hash>(
    pending: &mut FxHashMap<N, PendingTargets<N>>,
    source: N,
    target: N,
) {
    let targets = pending.entry(source).or_default();
    if !targets.contains(&target) {
        targets.push(target);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
