//! Error types for the core library.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

use crate::node::NodeId;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Bounded resources whose limits can be hit at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Ring members.
    Nodes,
    /// Deferred edits waiting on a node.
    PendingEdits,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Nodes => write!(f, "node"),
            Resource::PendingEdits => write!(f, "pending edit"),
        }
    }
}

/// Errors that can occur in the core library.
///
/// A document missing from both cache and store is not an error; it is
/// reported as [`Outcome::Fault`](crate::request::Outcome::Fault).
#[derive(Error, Debug)]
pub enum Error {
    /// A bounded collection is full.
    #[error("{resource} capacity exceeded (limit {limit})")]
    CapacityExceeded { resource: Resource, limit: usize },

    /// The node tag is not on the ring.
    #[error("node {0} is not a ring member")]
    NotAMember(NodeId),

    /// The node tag is already on the ring.
    #[error("node {0} is already a ring member")]
    AlreadyMember(NodeId),

    /// No node can serve the request.
    #[error("ring has no members")]
    EmptyRing,

    /// The sole remaining member cannot leave while it holds data.
    #[error("node {0} is the last member and still holds documents")]
    LastMember(NodeId),

    /// Malformed or oversized request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Memory could not be reserved; nothing was mutated.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}
