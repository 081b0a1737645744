//! Core library for the sharded document cache.
//!
//! This crate provides the building blocks of a simulated caching tier:
//! - Tokens and partitioners (hash functions for node tags and names)
//! - The consistent hash ring and its ownership rules
//! - A bounded LRU cache and the per-node document store
//! - Cache nodes with lazily applied edits
//! - The coordinator that routes requests and rebalances on join/leave

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod node;
pub mod partitioner;
pub mod pending;
pub mod request;
pub mod ring;
pub mod store;
pub mod token;
pub mod topology;

pub use cache::{LruCache, PutOutcome};
pub use config::ClusterConfig;
pub use coordinator::{Coordinator, JoinReport, LeaveReport};
pub use error::{Error, Result};
pub use node::{Node, NodeId};
pub use partitioner::Partitioner;
pub use request::{AppliedEdit, EditEffect, Outcome, Request, Response};
pub use ring::{HashRing, Ring, RingBuilder};
pub use store::{Document, DocumentStore};
pub use token::Token;
pub use topology::Topology;
