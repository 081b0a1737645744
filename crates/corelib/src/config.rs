//! Cluster configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bound on ring members.
pub const DEFAULT_MAX_NODES: usize = 99_999;
/// Default bound on deferred edits per node.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
/// Default bound on document name length, in bytes.
pub const DEFAULT_MAX_NAME_LEN: usize = 100;
/// Default bound on document content length, in bytes.
pub const DEFAULT_MAX_CONTENT_LEN: usize = 4096;

/// Knobs consumed by the coordinator and its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum number of ring members.
    pub max_nodes: usize,
    /// Maximum number of deferred edits per node.
    pub queue_capacity: usize,
    /// Maximum document name length in bytes.
    pub max_name_len: usize,
    /// Maximum document content length in bytes.
    pub max_content_len: usize,
    /// Reserved: accepted and reported, but ring placement ignores it.
    pub enable_vnodes: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
            enable_vnodes: false,
        }
    }
}

impl ClusterConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_max_name_len(mut self, len: usize) -> Self {
        self.max_name_len = len;
        self
    }

    pub fn with_max_content_len(mut self, len: usize) -> Self {
        self.max_content_len = len;
        self
    }

    pub fn with_vnodes(mut self, enabled: bool) -> Self {
        self.enable_vnodes = enabled;
        self
    }

    /// Rejects bounds that would make every operation fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(Error::InvalidConfig("max_nodes must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue_capacity must be > 0".into()));
        }
        if self.max_name_len == 0 {
            return Err(Error::InvalidConfig("max_name_len must be > 0".into()));
        }
        Ok(())
    }
}
