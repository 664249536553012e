//! Error types for graph construction and mapping.

use thiserror::Error;

/// Errors that can occur while building graphs, enumerating paths, or
/// searching for a mapping.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural error in a graph: duplicate ids, missing endpoints, illegal
    /// capability configuration, or malformed persisted input.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The sketch demands a role or capability the machine does not offer at
    /// all. Reported by the static pre-check before any search runs.
    #[error("sketch is not realizable on this machine: {0}")]
    IncompatibleSketch(String),

    /// The mapping search exhausted every assignment without success.
    #[error("no feasible mapping of the sketch onto the machine exists")]
    Infeasible,

    /// An edge bag could not be reassembled into a single contiguous flow.
    #[error("flow assembly failed: {0}")]
    AssemblyFailure(String),

    /// The caller's cancellation flag was raised during the search.
    #[error("mapping search was cancelled")]
    Cancelled,

    /// The caller's wall-clock budget ran out during the search.
    #[error("mapping search exceeded its time budget")]
    Timeout,
}
