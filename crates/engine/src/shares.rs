//! Share containers
//!
//! Secret values are carried as one ring tensor per party. Arithmetic
//! shares reconstruct by addition mod 2^k, boolean shares by XOR. Share
//! data is zeroized on drop to limit memory disclosure.

use mantle_ring::{Field, RingTensor};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Additive shares of a ring tensor: the plaintext is the mod-2^k sum of
/// the per-party parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ArithShares {
    parts: Vec<RingTensor>,
}

impl ArithShares {
    pub fn from_parts(parts: Vec<RingTensor>) -> Self {
        debug_assert!(!parts.is_empty());
        Self { parts }
    }

    pub fn parts(&self) -> &[RingTensor] {
        &self.parts
    }

    pub fn party_count(&self) -> usize {
        self.parts.len()
    }

    pub fn field(&self) -> Field {
        self.parts[0].field()
    }

    pub fn shape(&self) -> &[usize] {
        self.parts[0].shape()
    }
}

/// XOR shares of a bit-vector tensor: the plaintext is the XOR of the
/// per-party parts. `nbits` is an upper bound on the significant bit width
/// of the plaintext; engines may exploit it to shorten circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BoolShares {
    parts: Vec<RingTensor>,
    nbits: usize,
}

impl BoolShares {
    pub fn from_parts(parts: Vec<RingTensor>, nbits: usize) -> Self {
        debug_assert!(!parts.is_empty());
        Self { parts, nbits }
    }

    pub fn parts(&self) -> &[RingTensor] {
        &self.parts
    }

    pub fn party_count(&self) -> usize {
        self.parts.len()
    }

    pub fn field(&self) -> Field {
        self.parts[0].field()
    }

    pub fn shape(&self) -> &[usize] {
        self.parts[0].shape()
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Override the significant-bit hint.
    pub fn with_nbits(mut self, nbits: usize) -> Self {
        self.set_nbits(nbits);
        self
    }

    pub fn set_nbits(&mut self, nbits: usize) {
        self.nbits = nbits.min(self.field().bits());
    }
}
