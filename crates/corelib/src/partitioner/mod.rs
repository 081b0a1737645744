//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting node tags and document names
//! into tokens that can be placed on the hash ring.

pub mod mix;
pub mod sip;
pub mod traits;
pub mod xxh3;

pub use mix::MixPartitioner;
pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;
