//! Requests routed to cache nodes and the responses they produce.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::node::NodeId;

/// Client request addressed to whichever node owns `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Get { name: String },
    Edit { name: String, content: String },
}

impl Request {
    pub fn get(name: impl Into<String>) -> Self {
        Request::Get { name: name.into() }
    }

    pub fn edit(name: impl Into<String>, content: impl Into<String>) -> Self {
        Request::Edit {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn doc_name(&self) -> &str {
        match self {
            Request::Get { name } | Request::Edit { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::Get { .. } => "GET",
            Request::Edit { .. } => "EDIT",
        }
    }

    /// Checks name and content lengths against the configured bounds.
    pub fn validate(&self, config: &ClusterConfig) -> Result<()> {
        let name = self.doc_name();
        if name.is_empty() {
            return Err(Error::InvalidRequest("empty document name".into()));
        }
        if name.len() > config.max_name_len {
            return Err(Error::InvalidRequest(format!(
                "document name is {} bytes, limit is {}",
                name.len(),
                config.max_name_len
            )));
        }
        if let Request::Edit { content, .. } = self {
            if content.len() > config.max_content_len {
                return Err(Error::InvalidRequest(format!(
                    "document content is {} bytes, limit is {}",
                    content.len(),
                    config.max_content_len
                )));
            }
        }
        Ok(())
    }
}

/// Log classification of a served request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Found in the cache.
    Hit,
    /// Not cached; cached now without displacing anything.
    Miss,
    /// Not cached; caching it displaced `evicted`.
    Evict { evicted: String },
    /// Neither cached nor stored.
    Fault,
    /// Edit queued; `queued` edits are now waiting on the node.
    LazyDeferred { queued: usize },
}

impl Outcome {
    /// Stable upper-case label, also used as the metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Hit => "HIT",
            Outcome::Miss => "MISS",
            Outcome::Evict { .. } => "EVICT",
            Outcome::Fault => "FAULT",
            Outcome::LazyDeferred { .. } => "LAZY_DEFERRED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether an applied edit created the document or replaced its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditEffect {
    Created,
    Updated,
}

/// A deferred edit that a node has just executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    pub node_id: NodeId,
    pub doc_name: String,
    pub outcome: Outcome,
    pub effect: EditEffect,
}

/// Answer to a routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub node_id: NodeId,
    pub doc_name: String,
    pub outcome: Outcome,
    /// Document content for GET hits and misses; absent otherwise.
    pub payload: Option<String>,
    /// Edits flushed, in FIFO order, before this request was served.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedEdit>,
}
