//! Core partitioner trait definitions.

use crate::node::NodeId;
use crate::token::Token;

/// A partitioner converts node tags and document names into ring tokens.
///
/// Partitioners are stateless and deterministic: the same input always maps
/// to the same token, which is what makes ring ownership a pure function of
/// membership.
pub trait Partitioner: Send + Sync + 'static {
    /// Token of a node tag.
    fn hash_tag(&self, tag: NodeId) -> Token;

    /// Token of a document name (or any other key bytes).
    fn hash_key(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

/// Folds a 64-bit digest into the 32-bit ring space.
pub(crate) fn fold64(digest: u64) -> Token {
    Token((digest as u32) ^ ((digest >> 32) as u32))
}
