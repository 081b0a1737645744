//! Hash ring data structure.
//!
//! Members are kept in a sorted `Vec<RingEntry>`. Insertion and removal shift
//! the tail of the vector; lookups are binary searches. The sequence is read
//! circularly: past the largest token comes the smallest.

use std::sync::Arc;

use tracing::debug;

use crate::config::DEFAULT_MAX_NODES;
use crate::error::{Error, Resource, Result};
use crate::node::NodeId;
use crate::partitioner::{MixPartitioner, Partitioner};
use crate::ring::position::RingEntry;
use crate::token::Token;

/// Consistent hash ring of node tags.
#[derive(Debug)]
pub struct HashRing<P = MixPartitioner> {
    entries: Vec<RingEntry>,
    max_nodes: usize,
    partitioner: Arc<P>,
}

impl<P> Clone for HashRing<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            max_nodes: self.max_nodes,
            partitioner: Arc::clone(&self.partitioner),
        }
    }
}

impl HashRing<MixPartitioner> {
    /// Empty ring with the default partitioner and member bound.
    pub fn new() -> Self {
        Self::with_partitioner(MixPartitioner, DEFAULT_MAX_NODES)
    }
}

impl Default for HashRing<MixPartitioner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> HashRing<P> {
    pub fn with_partitioner(partitioner: P, max_nodes: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_nodes,
            partitioner: Arc::new(partitioner),
        }
    }

    pub fn partitioner(&self) -> &Arc<P> {
        &self.partitioner
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_nodes
    }

    /// Entries in ring order.
    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.node_id)
    }

    pub fn contains(&self, tag: NodeId) -> bool {
        self.position(tag).is_some()
    }

    /// Token of a member.
    pub fn token_of(&self, tag: NodeId) -> Option<Token> {
        self.position(tag).map(|idx| self.entries[idx].token)
    }

    /// Places `tag` on the ring and returns its token.
    pub fn insert(&mut self, tag: NodeId) -> Result<Token> {
        if self.contains(tag) {
            return Err(Error::AlreadyMember(tag));
        }
        if self.entries.len() >= self.max_nodes {
            return Err(Error::CapacityExceeded {
                resource: Resource::Nodes,
                limit: self.max_nodes,
            });
        }
        self.entries.try_reserve(1)?;

        let entry = RingEntry::new(self.partitioner.hash_tag(tag), tag);
        let idx = self.entries.partition_point(|e| *e < entry);
        self.entries.insert(idx, entry);
        debug!(node = %tag, token = %entry.token, position = idx, "ring insert");
        Ok(entry.token)
    }

    /// Takes `tag` off the ring.
    pub fn remove(&mut self, tag: NodeId) -> Result<RingEntry> {
        let idx = self.position(tag).ok_or(Error::NotAMember(tag))?;
        let entry = self.entries.remove(idx);
        debug!(node = %tag, token = %entry.token, "ring remove");
        Ok(entry)
    }

    /// First member whose token is strictly greater than `hash(tag)`,
    /// wrapping to the smallest token.
    pub fn successor(&self, tag: NodeId) -> Option<NodeId> {
        let token = self.partitioner.hash_tag(tag);
        let idx = self.entries.partition_point(|e| e.token <= token);
        self.wrapped(idx).map(|e| e.node_id)
    }

    /// Member that follows `tag` in ring order, wrapping.
    ///
    /// Matches [`successor`](Self::successor) whenever member tokens are
    /// distinct. On a token tie it still names the entry that owns the range
    /// adjacent to `tag`, which is what data migration needs. A single-member
    /// ring returns `tag` itself.
    pub fn next_entry(&self, tag: NodeId) -> Option<NodeId> {
        let idx = self.position(tag)?;
        self.wrapped(idx + 1).map(|e| e.node_id)
    }

    /// Member that precedes `tag` in ring order, wrapping.
    pub fn predecessor(&self, tag: NodeId) -> Option<RingEntry> {
        let idx = self.position(tag)?;
        let prev = if idx == 0 { self.entries.len() - 1 } else { idx - 1 };
        self.entries.get(prev).copied()
    }

    /// Owner of a key: the first member whose token is `>= hash(key)`,
    /// wrapping to the smallest token.
    pub fn owner_of(&self, key: &[u8]) -> Option<NodeId> {
        self.owner_of_token(self.partitioner.hash_key(key))
    }

    pub fn owner_of_token(&self, token: Token) -> Option<NodeId> {
        let idx = self.entries.partition_point(|e| e.token < token);
        self.wrapped(idx).map(|e| e.node_id)
    }

    fn wrapped(&self, idx: usize) -> Option<&RingEntry> {
        self.entries.get(idx).or_else(|| self.entries.first())
    }

    fn position(&self, tag: NodeId) -> Option<usize> {
        let token = self.partitioner.hash_tag(tag);
        self.entries
            .binary_search(&RingEntry::new(token, tag))
            .ok()
    }
}

/// Builder for [`HashRing`].
#[derive(Debug)]
pub struct RingBuilder<P = MixPartitioner> {
    partitioner: P,
    max_nodes: usize,
    members: Vec<NodeId>,
}

impl RingBuilder<MixPartitioner> {
    pub fn new() -> Self {
        Self {
            partitioner: MixPartitioner,
            max_nodes: DEFAULT_MAX_NODES,
            members: Vec::new(),
        }
    }
}

impl Default for RingBuilder<MixPartitioner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> RingBuilder<P> {
    /// Swaps the hash functions used for tags and keys.
    pub fn with_partitioner<Q: Partitioner>(self, partitioner: Q) -> RingBuilder<Q> {
        RingBuilder {
            partitioner,
            max_nodes: self.max_nodes,
            members: self.members,
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn add_node(mut self, tag: NodeId) -> Self {
        self.members.push(tag);
        self
    }

    /// Builds the ring, failing on duplicate tags or too many members.
    pub fn build(self) -> Result<HashRing<P>> {
        let mut ring = HashRing::with_partitioner(self.partitioner, self.max_nodes);
        for tag in self.members {
            ring.insert(tag)?;
        }
        Ok(ring)
    }
}
