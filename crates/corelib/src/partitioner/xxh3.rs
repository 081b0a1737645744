//! xxh3 partitioner implementation.

use xxhash_rust::xxh3::xxh3_64;

use crate::node::NodeId;
use crate::partitioner::traits::{fold64, Partitioner};
use crate::token::Token;

/// xxh3-64 folded to 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    fn hash_tag(&self, tag: NodeId) -> Token {
        fold64(xxh3_64(&tag.0.to_le_bytes()))
    }

    fn hash_key(&self, key: &[u8]) -> Token {
        fold64(xxh3_64(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Partitioner"
    }
}
