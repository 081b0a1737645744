//! Hash values placed on the ring.
//!
//! A token is the 32-bit output of a [`Partitioner`](crate::Partitioner) for
//! either a node tag or a document name. Tokens carry no numeric meaning
//! beyond their total order, which fixes the clockwise direction of the ring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position on the 32-bit hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Token(pub u32);

impl Token {
    /// Start of the ring.
    pub const MIN: Token = Token(0);
    /// End of the ring.
    pub const MAX: Token = Token(u32::MAX);

    /// Clockwise distance from `self` to `other`, wrapping past [`Token::MAX`].
    ///
    /// The distance from a token to itself is zero; callers that mean "the
    /// whole ring" must special-case a single-member ring.
    pub fn distance_to(&self, other: &Self) -> u64 {
        if other.0 >= self.0 {
            u64::from(other.0 - self.0)
        } else {
            (u64::from(u32::MAX) - u64::from(self.0)) + u64::from(other.0) + 1
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_forward() {
        assert_eq!(Token(100).distance_to(&Token(200)), 100);
        assert_eq!(Token(5).distance_to(&Token(5)), 0);
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(Token(u32::MAX).distance_to(&Token(0)), 1);
        assert_eq!(Token(200).distance_to(&Token(100)), u64::from(u32::MAX) - 99);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(Token(0x1f).to_string(), "0000001f");
    }
}
