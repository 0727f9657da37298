//! Change flag bitsets
//!
//! Every component kind defines its own one-byte set of change bits. The
//! generic framework only needs to combine, test and (de)serialize them.

use std::fmt::Debug;

/// One-byte change descriptor for a component kind
pub trait ChangeFlags: Copy + Eq + Debug {
    /// No change; never sent
    const NONE: Self;

    /// Union of every bit this kind defines
    const ALL: Self;

    /// Raw wire byte
    fn bits(self) -> u8;

    /// Build from a wire byte, keeping undefined bits
    fn from_bits_retain(bits: u8) -> Self;

    /// Build from a wire byte, rejecting undefined bits
    fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.bits() != 0 {
            None
        } else {
            Some(Self::from_bits_retain(bits))
        }
    }

    #[inline]
    fn is_empty(self) -> bool {
        self.bits() == 0
    }

    #[inline]
    fn contains(self, other: Self) -> bool {
        self.bits() & other.bits() == other.bits()
    }

    #[inline]
    fn union(self, other: Self) -> Self {
        Self::from_bits_retain(self.bits() | other.bits())
    }

    #[inline]
    fn difference(self, other: Self) -> Self {
        Self::from_bits_retain(self.bits() & !other.bits())
    }
}
