//! The node contract the cycle eliminator traverses.
//!
//! The eliminator is agnostic to how the caller represents its routines.
//! Any graph container can be traversed as long as it hands out small
//! copyable node handles and answers the queries below. Handle equality is
//! node identity: two handles that compare equal denote the same routine.
//!
//! Two edge kinds exist between nodes:
//!
//! - **Call edges** (caller → callee), with the inverse *caller* relation.
//! - **Field-read edges** (reader → writer): the reader observes a field the
//!   writer stores to. These are ordering hints, not semantic dependencies,
//!   so they are always safe to cut.
//!
//! Both relations must be kept symmetric by the implementation. The
//! eliminator only ever calls [`DependencyGraph::remove_caller`] and
//! [`DependencyGraph::remove_reader`], and relies on those to update both
//! sides of the edge.

use std::fmt;
use std::hash::Hash;

/// Read/write access to a dependency graph of routines.
pub trait DependencyGraph {
    /// Handle identifying one node of the graph.
    type Node: Copy + Eq + Hash + fmt::Debug;

    /// Identity of the routine a node represents. Removed call edges are
    /// reported in terms of routines.
    type Routine: Copy + Eq + Hash + fmt::Debug;

    /// The routine represented by `node`.
    fn routine(&self, node: Self::Node) -> Self::Routine;

    /// Returns `true` if `node` is a type initializer.
    fn is_type_initializer(&self, node: Self::Node) -> bool;

    /// Returns `true` if `node` must be inlined into every caller.
    ///
    /// Call edges into such a node must be kept so that the callee is
    /// processed before its callers.
    fn is_force_inline_target(&self, node: Self::Node) -> bool;

    /// Callees of `node` in an order that is stable across runs.
    fn ordered_callees(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Writers `node` depends on, in an order that is stable across runs.
    fn ordered_writers(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Returns `true` if `caller` calls `node`.
    fn has_caller(&self, node: Self::Node, caller: Self::Node) -> bool;

    /// Returns `true` if `node` calls `callee`.
    fn has_callee(&self, node: Self::Node, callee: Self::Node) -> bool;

    /// Returns `true` if `node` reads a field written by `writer`.
    fn has_writer(&self, node: Self::Node, writer: Self::Node) -> bool;

    /// Returns `true` if `reader` reads a field written by `node`.
    fn has_reader(&self, node: Self::Node, reader: Self::Node) -> bool;

    /// Remove the call edge `caller → node` from both endpoints.
    fn remove_caller(&mut self, node: Self::Node, caller: Self::Node);

    /// Remove the field-read edge `reader → node` from both endpoints.
    fn remove_reader(&mut self, node: Self::Node, reader: Self::Node);
}
