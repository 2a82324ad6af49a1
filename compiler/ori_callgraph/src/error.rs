//! Errors raised while breaking or scheduling call graph cycles.

use std::fmt;

use thiserror::Error;

/// Diagnostic reported when a cycle consists only of edges that must be kept.
pub const CYCLIC_FORCE_INLINING_MESSAGE: &str =
    "Unable to satisfy force inlining constraints due to cyclic force inlining";

/// Fatal call graph errors.
///
/// Neither variant is recoverable: both mean the caller's inlining
/// obligations or processing order cannot be satisfied.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CycleError<R: fmt::Debug> {
    /// Every edge of a cycle points at a force-inline target, so no edge
    /// can be cut without breaking an inlining obligation.
    ///
    /// `cycle` lists the routines on the cycle, starting from the routine
    /// whose call closed it.
    #[error("Unable to satisfy force inlining constraints due to cyclic force inlining")]
    CyclicForceInlining { cycle: Vec<R> },

    /// Bottom-up scheduling was requested on a graph that still has cycles.
    #[error("call graph still has a cycle ({} routines cannot be scheduled)", .remaining.len())]
    UnbrokenCycle { remaining: Vec<R> },
}

impl<R: fmt::Debug> CycleError<R> {
    /// Routines involved in the failure.
    pub fn routines(&self) -> &[R] {
        match self {
            CycleError::CyclicForceInlining { cycle } => cycle,
            CycleError::UnbrokenCycle { remaining } => remaining,
        }
    }
}
