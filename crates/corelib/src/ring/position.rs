//! Ring position implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::token::Token;

/// A node's position on the consistent hash ring.
///
/// The derived ordering compares the token first and the node id second, so a
/// sorted sequence of entries is ascending by hash with ties broken by
/// ascending tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RingEntry {
    pub token: Token,
    pub node_id: NodeId,
}

impl RingEntry {
    pub fn new(token: Token, node_id: NodeId) -> Self {
        Self { token, node_id }
    }
}

impl fmt::Display for RingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry(token={}, node={})", self.token, self.node_id)
    }
}
