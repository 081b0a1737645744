//! Authoritative per-node document store.
//!
//! Records are kept in append order and looked up by a linear scan of names.
//! The store itself accepts duplicate names; the node checks for an existing
//! record before appending.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A named document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Append-ordered collection of documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Reserves room for `additional` records so that following appends
    /// cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.docs.try_reserve(additional)?;
        Ok(())
    }

    /// Appends a record at the end.
    pub fn append(&mut self, doc: Document) -> Result<()> {
        self.docs.try_reserve(1)?;
        self.docs.push(doc);
        Ok(())
    }

    /// Appends every record, reserving room for all of them first.
    pub fn extend(&mut self, docs: Vec<Document>) -> Result<()> {
        self.docs.try_reserve(docs.len())?;
        self.docs.extend(docs);
        Ok(())
    }

    /// First record with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Document> {
        self.docs.iter().find(|doc| doc.name == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.docs.iter_mut().find(|doc| doc.name == name)
    }

    /// Replaces the content of the named record. Returns false if absent.
    pub fn update_content(&mut self, name: &str, content: &str) -> bool {
        match self.find_by_name_mut(name) {
            Some(doc) => {
                doc.content.clear();
                doc.content.push_str(content);
                true
            }
            None => false,
        }
    }

    /// Removes the first record with the given name.
    pub fn remove(&mut self, name: &str) -> Option<Document> {
        let pos = self.docs.iter().position(|doc| doc.name == name)?;
        Some(self.docs.remove(pos))
    }

    /// Splits off every record matching `pred`, keeping relative order on
    /// both sides.
    pub fn take_where<F>(&mut self, mut pred: F) -> Vec<Document>
    where
        F: FnMut(&Document) -> bool,
    {
        let (taken, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.docs).into_iter().partition(|doc| pred(doc));
        self.docs = kept;
        taken
    }

    /// Removes and returns every record in order.
    pub fn drain_all(&mut self) -> Vec<Document> {
        std::mem::take(&mut self.docs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.docs.iter().map(|doc| doc.name.as_str())
    }
}
