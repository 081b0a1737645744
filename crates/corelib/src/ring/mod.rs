//! Consistent hash ring implementation.
//!
//! The ring orders node tags by token and answers the two questions the
//! coordinator asks: which node owns a key, and which node neighbours a given
//! member.

pub mod position;
pub mod ring;

pub use position::RingEntry;
pub use ring::{HashRing, RingBuilder};

/// Alias for the main ring type (used by lib.rs).
pub type Ring<P = crate::partitioner::MixPartitioner> = HashRing<P>;
