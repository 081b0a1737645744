//! Ring topology snapshots.
//!
//! A read-only view of who owns which arc of the ring and how much data each
//! member holds. Produced by [`Coordinator::topology`](crate::Coordinator::topology).

use serde::Serialize;

use crate::node::NodeId;
use crate::token::Token;

/// One ring member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub node_id: NodeId,
    pub token: Token,
    /// Token of the predecessor; the member owns `(range_start, token]`.
    pub range_start: Token,
    /// Width of the owned arc in tokens (`2^32` for a lone member).
    pub arc: u64,
    pub documents: usize,
    pub cached: usize,
    pub pending: usize,
}

impl MemberView {
    /// Fraction of the ring owned by this member.
    pub fn share(&self) -> f64 {
        self.arc as f64 / (1u64 << 32) as f64
    }
}

/// Members in ring order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub partitioner: &'static str,
    pub members: Vec<MemberView>,
}

impl Topology {
    pub fn total_documents(&self) -> usize {
        self.members.iter().map(|m| m.documents).sum()
    }

    pub fn member(&self, node_id: NodeId) -> Option<&MemberView> {
        self.members.iter().find(|m| m.node_id == node_id)
    }
}
