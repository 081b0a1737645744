//! Request routing and ring membership changes.
//!
//! The coordinator owns the ring and every node. Requests go to the node that
//! owns the document name. Joins and leaves move documents between adjacent
//! nodes so that, afterwards, every document sits on the node the ring names
//! as its owner.

use std::collections::BTreeMap;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::node::{cache_capacity, Node, NodeId};
use crate::partitioner::{MixPartitioner, Partitioner};
use crate::request::{AppliedEdit, Request, Response};
use crate::ring::HashRing;
use crate::topology::{MemberView, Topology};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    pub node_id: NodeId,
    /// Node that handed documents over; `None` for the first member.
    pub donor: Option<NodeId>,
    pub moved: usize,
    /// Donor edits flushed before the hand-over, in FIFO order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedEdit>,
}

/// Result of a successful leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveReport {
    pub node_id: NodeId,
    /// Node that inherited the documents; `None` if the ring is now empty.
    pub heir: Option<NodeId>,
    pub moved: usize,
    /// Edits the leaving node flushed before handing off, in FIFO order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedEdit>,
}

/// Front door of the simulated cache tier.
#[derive(Debug)]
pub struct Coordinator<P = MixPartitioner> {
    config: ClusterConfig,
    ring: HashRing<P>,
    nodes: BTreeMap<NodeId, Node>,
}

impl Coordinator<MixPartitioner> {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        Self::with_partitioner(config, MixPartitioner)
    }
}

impl<P: Partitioner> Coordinator<P> {
    pub fn with_partitioner(config: ClusterConfig, partitioner: P) -> Result<Self> {
        config.validate()?;
        if config.enable_vnodes {
            info!("virtual nodes requested; placement uses one token per node");
        }
        let ring = HashRing::with_partitioner(partitioner, config.max_nodes);
        Ok(Self {
            config,
            ring,
            nodes: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn ring(&self) -> &HashRing<P> {
        &self.ring
    }

    pub fn node(&self, tag: NodeId) -> Option<&Node> {
        self.nodes.get(&tag)
    }

    /// Nodes in tag order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Documents stored across all nodes.
    pub fn document_count(&self) -> usize {
        self.nodes.values().map(Node::document_count).sum()
    }

    /// Node currently responsible for `name`.
    pub fn locate(&self, name: &str) -> Option<NodeId> {
        self.ring.owner_of(name.as_bytes())
    }

    /// Adds a node and pulls over the documents it now owns.
    pub fn join(&mut self, tag: NodeId, cache_size: usize) -> Result<JoinReport> {
        let capacity = cache_capacity(cache_size)?;
        if let Err(err) = self.ring.insert(tag) {
            warn!(node = %tag, error = %err, "join refused");
            return Err(err);
        }
        self.nodes
            .insert(tag, Node::new(tag, capacity, self.config.queue_capacity));

        let donor = match self.ring.next_entry(tag) {
            Some(donor) if donor != tag => donor,
            _ => {
                info!(node = %tag, "first node joined");
                return Ok(JoinReport {
                    node_id: tag,
                    donor: None,
                    moved: 0,
                    applied: Vec::new(),
                });
            }
        };

        let (moved, applied) = match self.migrate_to_new_node(tag, donor) {
            Ok(done) => done,
            Err(err) => {
                // Nothing has moved yet.
                self.undo_join(tag)?;
                return Err(err);
            }
        };

        counter!("docring_migrated_documents_total").increment(moved as u64);
        info!(node = %tag, donor = %donor, moved, "node joined");
        Ok(JoinReport {
            node_id: tag,
            donor: Some(donor),
            moved,
            applied,
        })
    }

    /// Removes a node, handing all of its documents to its ring successor.
    pub fn leave(&mut self, tag: NodeId) -> Result<LeaveReport> {
        let Some(heir) = self.ring.next_entry(tag) else {
            warn!(node = %tag, "leave refused: not a member");
            return Err(Error::NotAMember(tag));
        };

        if heir == tag {
            let node = self.node_ref(tag)?;
            if node.document_count() > 0 || node.pending_len() > 0 {
                warn!(node = %tag, "leave refused: last member holds documents");
                return Err(Error::LastMember(tag));
            }
            self.ring.remove(tag)?;
            self.nodes.remove(&tag);
            info!(node = %tag, "last node left");
            return Ok(LeaveReport {
                node_id: tag,
                heir: None,
                moved: 0,
                applied: Vec::new(),
            });
        }

        let applied = self.node_mut(tag)?.flush()?;
        let moving = self.node_ref(tag)?.document_count();
        self.node_mut(heir)?.reserve_for_absorb(moving)?;

        let docs = self.node_mut(tag)?.take_all_documents();
        let moved = docs.len();
        self.node_mut(heir)?.absorb(docs)?;

        self.ring.remove(tag)?;
        self.nodes.remove(&tag);

        counter!("docring_migrated_documents_total").increment(moved as u64);
        info!(node = %tag, heir = %heir, moved, "node left");
        Ok(LeaveReport {
            node_id: tag,
            heir: Some(heir),
            moved,
            applied,
        })
    }

    /// Dispatches a request to the owning node and returns its response.
    pub fn route(&mut self, request: Request) -> Result<Response> {
        request.validate(&self.config)?;
        let owner = self
            .ring
            .owner_of(request.doc_name().as_bytes())
            .ok_or(Error::EmptyRing)?;
        debug!(kind = request.kind(), doc = request.doc_name(), node = %owner, "routing");
        self.node_mut(owner)?.handle(request)
    }

    /// Runs every node's pending edits, nodes taken in tag order.
    pub fn flush_all(&mut self) -> Result<Vec<AppliedEdit>> {
        let mut applied = Vec::new();
        for node in self.nodes.values_mut() {
            applied.extend(node.flush()?);
        }
        Ok(applied)
    }

    /// Per-member view in ring order.
    pub fn topology(&self) -> Topology {
        let lone = self.ring.len() == 1;
        let members = self
            .ring
            .entries()
            .iter()
            .map(|entry| {
                let prev = self.ring.predecessor(entry.node_id).unwrap_or(*entry);
                let node = self.nodes.get(&entry.node_id);
                MemberView {
                    node_id: entry.node_id,
                    token: entry.token,
                    range_start: prev.token,
                    arc: if lone {
                        1u64 << 32
                    } else {
                        prev.token.distance_to(&entry.token)
                    },
                    documents: node.map_or(0, Node::document_count),
                    cached: node.map_or(0, |n| n.cache().len()),
                    pending: node.map_or(0, Node::pending_len),
                }
            })
            .collect();
        Topology {
            partitioner: self.ring.partitioner_name(),
            members,
        }
    }

    fn migrate_to_new_node(
        &mut self,
        tag: NodeId,
        donor: NodeId,
    ) -> Result<(usize, Vec<AppliedEdit>)> {
        let applied = self.node_mut(donor)?.flush()?;

        let ring = &self.ring;
        let candidates = self
            .node_ref(donor)?
            .store()
            .iter()
            .filter(|doc| ring.owner_of(doc.name.as_bytes()) == Some(tag))
            .count();
        self.node_mut(tag)?.reserve_for_absorb(candidates)?;

        let ring = &self.ring;
        let donor_node = self
            .nodes
            .get_mut(&donor)
            .ok_or_else(|| Error::Internal(format!("ring member {donor} has no node")))?;
        let docs =
            donor_node.take_documents_where(|doc| ring.owner_of(doc.name.as_bytes()) == Some(tag));
        let moved = docs.len();
        self.node_mut(tag)?.absorb(docs)?;
        Ok((moved, applied))
    }

    /// Takes a half-joined node back off the ring.
    fn undo_join(&mut self, tag: NodeId) -> Result<()> {
        self.nodes.remove(&tag);
        match self.ring.remove(tag) {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(node = %tag, error = %err, "join rollback left ring out of step");
                Err(Error::Internal(format!("rollback of node {tag} failed: {err}")))
            }
        }
    }

    fn node_ref(&self, tag: NodeId) -> Result<&Node> {
        self.nodes
            .get(&tag)
            .ok_or_else(|| Error::Internal(format!("ring member {tag} has no node")))
    }

    fn node_mut(&mut self, tag: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&tag)
            .ok_or_else(|| Error::Internal(format!("ring member {tag} has no node")))
    }
}
