//! The share engine capability trait

use std::sync::Arc;

use mantle_ring::{Field, RingTensor};

use crate::error::Result;
use crate::shares::{ArithShares, BoolShares};

/// The primitive operations the arithmetic layer consumes from an MPC
/// protocol backend.
///
/// Method families follow the operand domains: `_aa` takes two secret
/// operands, `_ap`/`_pa` mix a secret and a public one. Linear operations
/// (addition, XOR, shifts of boolean shares, multiplication by a public
/// value) act on each party's share locally; everything else is allowed to
/// cost communication rounds in a real backend.
///
/// Engines are shared read-only across forked evaluation contexts, so
/// implementations must be `Send + Sync` and keep any randomness state
/// behind interior mutability.
pub trait ShareEngine: Send + Sync {
    fn field(&self) -> Field;

    fn party_count(&self) -> usize;

    /// Split a plaintext tensor into fresh arithmetic shares.
    fn share(&self, plain: &RingTensor) -> Result<ArithShares>;

    /// Open arithmetic shares to the plaintext (a2p).
    fn reveal_a(&self, x: &ArithShares) -> Result<RingTensor>;

    /// Open boolean shares to the plaintext (b2p).
    fn reveal_b(&self, x: &BoolShares) -> Result<RingTensor>;

    // Arithmetic domain.

    fn add_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares>;

    fn add_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares>;

    fn negate_a(&self, x: &ArithShares) -> Result<ArithShares>;

    fn sub_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares> {
        self.add_aa(x, &self.negate_a(y)?)
    }

    fn mul_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares>;

    fn mul_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares>;

    /// Matrix product of two secret 2-D tensors.
    fn mmul_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares>;

    fn mmul_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares>;

    fn mmul_pa(&self, x: &RingTensor, y: &ArithShares) -> Result<ArithShares>;

    /// Multiply by 2^bits (linear).
    fn lshift_a(&self, x: &ArithShares, bits: usize) -> Result<ArithShares>;

    /// Protocol-safe division by 2^bits. Probabilistic: the result may be
    /// off by one ulp from the floored quotient.
    fn trunc_a(&self, x: &ArithShares, bits: usize) -> Result<ArithShares>;

    /// The sign bit as a 1-bit boolean share.
    fn msb_a(&self, x: &ArithShares) -> Result<BoolShares>;

    /// Select `a` where the 0/1 predicate is set, `b` elsewhere.
    fn mux_a(&self, pred: &ArithShares, a: &ArithShares, b: &ArithShares) -> Result<ArithShares> {
        let diff = self.sub_aa(a, b)?;
        self.add_aa(b, &self.mul_aa(pred, &diff)?)
    }

    // Boolean domain.

    fn xor_bb(&self, x: &BoolShares, y: &BoolShares) -> Result<BoolShares>;

    fn xor_bp(&self, x: &BoolShares, y: &RingTensor) -> Result<BoolShares>;

    fn and_bb(&self, x: &BoolShares, y: &BoolShares) -> Result<BoolShares>;

    fn and_bp(&self, x: &BoolShares, y: &RingTensor) -> Result<BoolShares>;

    fn lshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares>;

    fn rshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares>;

    fn arshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares>;

    fn bitrev_b(&self, x: &BoolShares, start: usize, end: usize) -> Result<BoolShares>;

    fn bitdeintl_b(&self, x: &BoolShares) -> Result<BoolShares>;

    /// XOR-reduce the low `nbits` bits to a single shared bit.
    fn bit_parity_b(&self, x: &BoolShares, nbits: usize) -> Result<BoolShares>;

    /// Fill every bit below the highest set bit.
    fn prefix_or_b(&self, x: &BoolShares) -> Result<BoolShares>;

    /// Count the set bits among the low `nbits`, as an arithmetic share.
    fn popcount_b(&self, x: &BoolShares, nbits: usize) -> Result<ArithShares>;

    // Domain conversions.

    fn a2b(&self, x: &ArithShares) -> Result<BoolShares>;

    fn b2a(&self, x: &BoolShares) -> Result<ArithShares>;

    /// An engine with the same configuration but independent randomness
    /// streams, for use by a forked evaluation context. All parties fork in
    /// the same order, so the children stay aligned.
    fn fork(&self) -> Arc<dyn ShareEngine>;
}
