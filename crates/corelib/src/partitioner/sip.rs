//! SipHash partitioner implementation.

use siphasher::sip::SipHasher13;
use std::hash::Hasher;

use crate::node::NodeId;
use crate::partitioner::traits::{fold64, Partitioner};
use crate::token::Token;

/// SipHash-1-3 with zero keys, folded to 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl SipPartitioner {
    fn digest(data: &[u8]) -> u64 {
        let mut hasher = SipHasher13::new();
        hasher.write(data);
        hasher.finish()
    }
}

impl Partitioner for SipPartitioner {
    fn hash_tag(&self, tag: NodeId) -> Token {
        fold64(Self::digest(&tag.0.to_le_bytes()))
    }

    fn hash_key(&self, key: &[u8]) -> Token {
        fold64(Self::digest(key))
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Xxh3Partitioner;

    #[test]
    fn test_partitioners_are_deterministic() {
        let sip = SipPartitioner;
        let xxh = Xxh3Partitioner;
        assert_eq!(sip.hash_key(b"report"), sip.hash_key(b"report"));
        assert_eq!(xxh.hash_key(b"report"), xxh.hash_key(b"report"));
        assert_eq!(sip.hash_tag(NodeId(3)), sip.hash_tag(NodeId(3)));
    }

    #[test]
    fn test_distinct_inputs_spread() {
        let sip = SipPartitioner;
        assert_ne!(sip.hash_key(b"a"), sip.hash_key(b"b"));
        assert_ne!(sip.hash_tag(NodeId(1)), sip.hash_tag(NodeId(2)));
    }
}
