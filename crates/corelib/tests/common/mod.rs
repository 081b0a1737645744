//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use corelib::node::NodeId;
use corelib::partitioner::{MixPartitioner, Partitioner};
use corelib::token::Token;

/// Partitioner with hand-picked tokens.
///
/// Tags hash to themselves unless overridden; names come from the table and
/// fall back to djb2.
#[derive(Debug, Default)]
pub struct TablePartitioner {
    tags: HashMap<u32, u32>,
    keys: HashMap<String, u32>,
}

impl TablePartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: &str, token: u32) -> Self {
        self.keys.insert(name.to_string(), token);
        self
    }

    pub fn tag(mut self, tag: u32, token: u32) -> Self {
        self.tags.insert(tag, token);
        self
    }
}

impl Partitioner for TablePartitioner {
    fn hash_tag(&self, tag: NodeId) -> Token {
        Token(*self.tags.get(&tag.0).unwrap_or(&tag.0))
    }

    fn hash_key(&self, key: &[u8]) -> Token {
        let name = String::from_utf8_lossy(key);
        match self.keys.get(name.as_ref()) {
            Some(token) => Token(*token),
            None => Token(MixPartitioner::djb2(key)),
        }
    }

    fn name(&self) -> &'static str {
        "TablePartitioner"
    }
}
