//! Deferred edits awaiting lazy application.
//!
//! EDIT requests are not applied when they arrive. They wait here, in FIFO
//! order, until the next GET on the node or the next membership change that
//! touches it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Resource, Result};

/// An edit waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    pub name: String,
    pub content: String,
}

impl PendingEdit {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Bounded FIFO of pending edits.
#[derive(Debug, Clone)]
pub struct PendingEditQueue {
    capacity: usize,
    edits: VecDeque<PendingEdit>,
}

impl PendingEditQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            edits: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.edits.len() >= self.capacity
    }

    /// Enqueues an edit and returns the queue depth afterwards.
    pub fn push(&mut self, edit: PendingEdit) -> Result<usize> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                resource: Resource::PendingEdits,
                limit: self.capacity,
            });
        }
        self.edits.try_reserve(1)?;
        self.edits.push_back(edit);
        Ok(self.edits.len())
    }

    pub fn pop_front(&mut self) -> Option<PendingEdit> {
        self.edits.pop_front()
    }

    /// Puts back an edit that was popped but could not be applied.
    pub fn push_front(&mut self, edit: PendingEdit) {
        self.edits.push_front(edit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEdit> {
        self.edits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = PendingEditQueue::new(4);
        assert_eq!(q.push(PendingEdit::new("a", "1")).unwrap(), 1);
        assert_eq!(q.push(PendingEdit::new("b", "2")).unwrap(), 2);
        assert_eq!(q.pop_front().map(|e| e.name), Some("a".to_string()));
        assert_eq!(q.pop_front().map(|e| e.name), Some("b".to_string()));
        assert!(q.pop_front().is_none());
    }

    #[test]
    fn test_full_queue_is_an_error() {
        let mut q = PendingEditQueue::new(1);
        q.push(PendingEdit::new("a", "1")).unwrap();
        assert!(q.is_full());
        let err = q.push(PendingEdit::new("b", "2")).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                resource: Resource::PendingEdits,
                limit: 1
            }
        ));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_push_front_restores_head() {
        let mut q = PendingEditQueue::new(2);
        q.push(PendingEdit::new("a", "1")).unwrap();
        q.push(PendingEdit::new("b", "2")).unwrap();
        let head = q.pop_front().unwrap();
        q.push_front(head);
        let names: Vec<_> = q.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
