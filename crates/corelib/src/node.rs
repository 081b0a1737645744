//! Cache nodes.
//!
//! A node owns an LRU cache in front of an authoritative document store, plus
//! a queue of deferred edits. EDIT requests only enqueue; GET requests first
//! flush the queue, in FIFO order, and are then served from the cache or the
//! store. Nodes are identified by a compact `NodeId` tag.

use std::fmt;
use std::num::NonZeroUsize;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cache::{LruCache, PutOutcome};
use crate::error::{Error, Result};
use crate::pending::{PendingEdit, PendingEditQueue};
use crate::request::{AppliedEdit, EditEffect, Outcome, Request, Response};
use crate::store::{Document, DocumentStore};

/// Integer tag identifying a node; stable for the node's lifetime.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(tag: u32) -> Self {
        NodeId(tag)
    }
}

/// Per-node request counters, one per log classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub faults: u64,
    pub deferred: u64,
}

impl NodeStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::Evict { .. } => self.evictions += 1,
            Outcome::Fault => self.faults += 1,
            Outcome::LazyDeferred { .. } => self.deferred += 1,
        }
        counter!("docring_requests_total", "outcome" => outcome.label()).increment(1);
    }
}

/// A cache server on the ring.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    cache: LruCache<String, String>,
    store: DocumentStore,
    pending: PendingEditQueue,
    stats: NodeStats,
}

impl Node {
    /// Node with an empty cache, store and queue.
    pub fn new(id: NodeId, cache_capacity: NonZeroUsize, queue_capacity: usize) -> Self {
        Self {
            id,
            cache: LruCache::new(cache_capacity),
            store: DocumentStore::new(),
            pending: PendingEditQueue::new(queue_capacity),
            stats: NodeStats::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn cache(&self) -> &LruCache<String, String> {
        &self.cache
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn document_count(&self) -> usize {
        self.store.len()
    }

    /// Serves one request.
    pub fn handle(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::Edit { name, content } => self.defer_edit(name, content),
            Request::Get { name } => {
                let applied = self.flush()?;
                let mut response = self.get_document(name)?;
                response.applied = applied;
                Ok(response)
            }
        }
    }

    /// Applies every pending edit in FIFO order.
    ///
    /// If an edit cannot be applied it goes back to the head of the queue and
    /// the error is returned; edits applied before it stay applied.
    pub fn flush(&mut self) -> Result<Vec<AppliedEdit>> {
        let mut applied = Vec::with_capacity(self.pending.len());
        while let Some(edit) = self.pending.pop_front() {
            match self.apply_edit(&edit) {
                Ok(done) => applied.push(done),
                Err(err) => {
                    self.pending.push_front(edit);
                    return Err(err);
                }
            }
        }
        if !applied.is_empty() {
            debug!(node = %self.id, count = applied.len(), "flushed pending edits");
        }
        Ok(applied)
    }

    /// Removes matching documents from the store and the cache.
    ///
    /// Pending edits are not flushed here; callers flush first.
    pub fn take_documents_where<F>(&mut self, pred: F) -> Vec<Document>
    where
        F: FnMut(&Document) -> bool,
    {
        let taken = self.store.take_where(pred);
        for doc in &taken {
            self.cache.remove(doc.name.as_str());
        }
        taken
    }

    /// Removes every document from the store and the cache.
    pub fn take_all_documents(&mut self) -> Vec<Document> {
        let taken = self.store.drain_all();
        for doc in &taken {
            self.cache.remove(doc.name.as_str());
        }
        taken
    }

    /// Makes room for `count` migrated documents ahead of [`absorb`](Self::absorb).
    pub fn reserve_for_absorb(&mut self, count: usize) -> Result<()> {
        self.store.reserve(count)
    }

    /// Appends migrated documents to the store. The cache is left cold.
    pub fn absorb(&mut self, docs: Vec<Document>) -> Result<()> {
        self.store.extend(docs)
    }

    fn defer_edit(&mut self, name: String, content: String) -> Result<Response> {
        let queued = self.pending.push(PendingEdit::new(name.clone(), content))?;
        trace!(node = %self.id, doc = %name, queued, "edit deferred");
        let outcome = Outcome::LazyDeferred { queued };
        self.stats.record(&outcome);
        Ok(Response {
            node_id: self.id,
            doc_name: name,
            outcome,
            payload: None,
            applied: Vec::new(),
        })
    }

    fn apply_edit(&mut self, edit: &PendingEdit) -> Result<AppliedEdit> {
        let (outcome, effect) = if self.cache.get(edit.name.as_str()).is_some() {
            self.cache.put(edit.name.clone(), edit.content.clone())?;
            self.store.update_content(&edit.name, &edit.content);
            (Outcome::Hit, EditEffect::Updated)
        } else if self.store.find_by_name(&edit.name).is_none() {
            self.store.reserve(1)?;
            let put = self.cache.put(edit.name.clone(), edit.content.clone())?;
            self.store
                .append(Document::new(edit.name.clone(), edit.content.clone()))?;
            (classify(put), EditEffect::Created)
        } else {
            let put = self.cache.put(edit.name.clone(), edit.content.clone())?;
            self.store.update_content(&edit.name, &edit.content);
            (classify(put), EditEffect::Updated)
        };

        debug!(node = %self.id, doc = %edit.name, outcome = %outcome, ?effect, "edit applied");
        self.stats.record(&outcome);
        Ok(AppliedEdit {
            node_id: self.id,
            doc_name: edit.name.clone(),
            outcome,
            effect,
        })
    }

    fn get_document(&mut self, name: String) -> Result<Response> {
        let (outcome, payload) = if let Some(content) = self.cache.get(name.as_str()) {
            (Outcome::Hit, Some(content.clone()))
        } else if let Some(doc) = self.store.find_by_name(&name) {
            let content = doc.content.clone();
            let put = self.cache.put(name.clone(), content.clone())?;
            (classify(put), Some(content))
        } else {
            (Outcome::Fault, None)
        };

        debug!(node = %self.id, doc = %name, outcome = %outcome, "get served");
        self.stats.record(&outcome);
        Ok(Response {
            node_id: self.id,
            doc_name: name,
            outcome,
            payload,
            applied: Vec::new(),
        })
    }
}

/// Log classification of a cache fill.
fn classify(put: PutOutcome<String>) -> Outcome {
    match put.into_evicted() {
        Some(evicted) => Outcome::Evict { evicted },
        None => Outcome::Miss,
    }
}

/// Converts a raw cache size into the non-zero capacity a node needs.
pub(crate) fn cache_capacity(size: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(size)
        .ok_or_else(|| Error::InvalidConfig("cache capacity must be > 0".into()))
}
