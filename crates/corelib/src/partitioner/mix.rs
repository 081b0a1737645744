//! Default partitioner: integer avalanche mix for tags, djb2 for names.

use crate::node::NodeId;
use crate::partitioner::traits::Partitioner;
use crate::token::Token;

const MIX_MULTIPLIER: u32 = 0x45d9_f3b;
const DJB2_SEED: u32 = 5381;

/// Cheap, well-spread 32-bit hashes with no external state.
#[derive(Clone, Copy, Debug, Default)]
pub struct MixPartitioner;

impl MixPartitioner {
    /// Avalanche mix of a 32-bit integer.
    pub fn mix(value: u32) -> u32 {
        let mut x = value;
        x = ((x >> 16) ^ x).wrapping_mul(MIX_MULTIPLIER);
        x = ((x >> 16) ^ x).wrapping_mul(MIX_MULTIPLIER);
        (x >> 16) ^ x
    }

    /// djb2 string hash (`h * 33 + byte`).
    pub fn djb2(bytes: &[u8]) -> u32 {
        bytes.iter().fold(DJB2_SEED, |hash, &b| {
            (hash << 5).wrapping_add(hash).wrapping_add(u32::from(b))
        })
    }
}

impl Partitioner for MixPartitioner {
    fn hash_tag(&self, tag: NodeId) -> Token {
        Token(Self::mix(tag.0))
    }

    fn hash_key(&self, key: &[u8]) -> Token {
        Token(Self::djb2(key))
    }

    fn name(&self) -> &'static str {
        "MixPartitioner"
    }
}
