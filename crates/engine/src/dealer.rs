//! Dealer-assisted reference engine
//!
//! `DealerEngine` runs the 2-party additive/XOR share algebra in a single
//! process. Linear operations are computed on each party's share exactly as
//! a networked semi-honest engine would; multiplicative operations consume
//! Beaver triples issued by a local trusted dealer, and the remaining
//! nonlinear primitives (comparison, domain conversion, prefix-or,
//! popcount) are realised dealer-side.
//!
//! The dealer is local and fully trusted, so this engine provides
//! correctness for tests and demos, not deployment security. Production
//! engines implement the same [`ShareEngine`] trait over a real transport.

use std::sync::{Arc, Mutex, PoisonError};

use mantle_ring::{broadcast_shapes, Field, RingTensor};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::trace;

use crate::engine::ShareEngine;
use crate::error::{EngineError, Result};
use crate::shares::{ArithShares, BoolShares};

const PARTIES: usize = 2;

/// Largest significant bit width across the elements of a public tensor.
fn sig_bits(t: &RingTensor) -> usize {
    t.elems()
        .iter()
        .map(|e| 128 - e.leading_zeros() as usize)
        .max()
        .unwrap_or(0)
}

/// In-process 2-party engine with a local trusted dealer.
pub struct DealerEngine {
    field: Field,
    prng: Mutex<ChaCha20Rng>,
}

impl DealerEngine {
    pub fn new(field: Field, seed: u64) -> Self {
        Self {
            field,
            prng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    fn rand_tensor(&self, shape: &[usize]) -> Result<RingTensor> {
        let mut rng = self.prng.lock().unwrap_or_else(PoisonError::into_inner);
        let numel: usize = shape.iter().product();
        let elems = (0..numel)
            .map(|_| ((rng.next_u64() as u128) << 64) | rng.next_u64() as u128)
            .collect();
        Ok(RingTensor::from_raw(self.field, shape.to_vec(), elems)?)
    }

    fn check_arith(&self, x: &ArithShares) -> Result<()> {
        if x.party_count() != PARTIES {
            return Err(EngineError::PartyCountMismatch {
                expected: PARTIES,
                got: x.party_count(),
            });
        }
        Ok(())
    }

    fn check_bool(&self, x: &BoolShares) -> Result<()> {
        if x.party_count() != PARTIES {
            return Err(EngineError::PartyCountMismatch {
                expected: PARTIES,
                got: x.party_count(),
            });
        }
        Ok(())
    }

    /// Additive resharing of a plaintext.
    fn share_plain(&self, plain: &RingTensor) -> Result<ArithShares> {
        let r = self.rand_tensor(plain.shape())?;
        let p0 = plain.sub(&r)?;
        Ok(ArithShares::from_parts(vec![p0, r]))
    }

    /// XOR resharing of a plaintext.
    fn share_plain_b(&self, plain: &RingTensor, nbits: usize) -> Result<BoolShares> {
        let r = self.rand_tensor(plain.shape())?;
        let p0 = plain.xor(&r)?;
        Ok(BoolShares::from_parts(vec![p0, r], nbits.min(self.field.bits())))
    }

    /// Broadcast every part of a share to a common shape.
    fn broadcast_parts(&self, parts: &[RingTensor], shape: &[usize]) -> Result<Vec<RingTensor>> {
        let zero = RingTensor::zeros(self.field, shape.to_vec());
        parts.iter().map(|p| Ok(p.add(&zero)?)).collect()
    }
}

impl ShareEngine for DealerEngine {
    fn field(&self) -> Field {
        self.field
    }

    fn party_count(&self) -> usize {
        PARTIES
    }

    fn share(&self, plain: &RingTensor) -> Result<ArithShares> {
        self.share_plain(plain)
    }

    fn reveal_a(&self, x: &ArithShares) -> Result<RingTensor> {
        self.check_arith(x)?;
        Ok(x.parts()[0].add(&x.parts()[1])?)
    }

    fn reveal_b(&self, x: &BoolShares) -> Result<RingTensor> {
        self.check_bool(x)?;
        Ok(x.parts()[0].xor(&x.parts()[1])?)
    }

    fn add_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares> {
        self.check_arith(x)?;
        self.check_arith(y)?;
        let parts = x
            .parts()
            .iter()
            .zip(y.parts())
            .map(|(a, b)| Ok(a.add(b)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArithShares::from_parts(parts))
    }

    fn add_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares> {
        self.check_arith(x)?;
        // Only one party offsets by the public value; the other parts are
        // broadcast so every share ends up at the common shape.
        let shape = broadcast_shapes(x.shape(), y.shape())?;
        let mut parts = self.broadcast_parts(x.parts(), &shape)?;
        parts[0] = parts[0].add(y)?;
        Ok(ArithShares::from_parts(parts))
    }

    fn negate_a(&self, x: &ArithShares) -> Result<ArithShares> {
        self.check_arith(x)?;
        Ok(ArithShares::from_parts(
            x.parts().iter().map(|p| p.negate()).collect(),
        ))
    }

    fn mul_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares> {
        self.check_arith(x)?;
        self.check_arith(y)?;
        let shape = broadcast_shapes(x.shape(), y.shape())?;
        trace!(?shape, "beaver mul");
        // Dealer issues a multiplication triple at the output shape.
        let a = self.rand_tensor(&shape)?;
        let b = self.rand_tensor(&shape)?;
        let c = a.mul(&b)?;
        let a_sh = self.share_plain(&a)?;
        let b_sh = self.share_plain(&b)?;
        let c_sh = self.share_plain(&c)?;
        // Parties open the masked operands.
        let d = self.reveal_a(x)?.sub(&a)?;
        let e = self.reveal_a(y)?.sub(&b)?;
        let mut parts = Vec::with_capacity(PARTIES);
        for i in 0..PARTIES {
            let mut z = c_sh.parts()[i]
                .add(&d.mul(&b_sh.parts()[i])?)?
                .add(&e.mul(&a_sh.parts()[i])?)?;
            if i == 0 {
                z = z.add(&d.mul(&e)?)?;
            }
            parts.push(z);
        }
        Ok(ArithShares::from_parts(parts))
    }

    fn mul_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares> {
        self.check_arith(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.mul(y)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArithShares::from_parts(parts))
    }

    fn mmul_aa(&self, x: &ArithShares, y: &ArithShares) -> Result<ArithShares> {
        self.check_arith(x)?;
        self.check_arith(y)?;
        trace!(lhs = ?x.shape(), rhs = ?y.shape(), "beaver matmul");
        // Matrix triple: C = A * B at the operand shapes.
        let a = self.rand_tensor(x.shape())?;
        let b = self.rand_tensor(y.shape())?;
        let c = a.matmul(&b)?;
        let a_sh = self.share_plain(&a)?;
        let b_sh = self.share_plain(&b)?;
        let c_sh = self.share_plain(&c)?;
        let d = self.reveal_a(x)?.sub(&a)?;
        let e = self.reveal_a(y)?.sub(&b)?;
        let mut parts = Vec::with_capacity(PARTIES);
        for i in 0..PARTIES {
            let mut z = c_sh.parts()[i]
                .add(&d.matmul(&b_sh.parts()[i])?)?
                .add(&a_sh.parts()[i].matmul(&e)?)?;
            if i == 0 {
                z = z.add(&d.matmul(&e)?)?;
            }
            parts.push(z);
        }
        Ok(ArithShares::from_parts(parts))
    }

    fn mmul_ap(&self, x: &ArithShares, y: &RingTensor) -> Result<ArithShares> {
        self.check_arith(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.matmul(y)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArithShares::from_parts(parts))
    }

    fn mmul_pa(&self, x: &RingTensor, y: &ArithShares) -> Result<ArithShares> {
        self.check_arith(y)?;
        let parts = y
            .parts()
            .iter()
            .map(|p| Ok(x.matmul(p)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArithShares::from_parts(parts))
    }

    fn lshift_a(&self, x: &ArithShares, bits: usize) -> Result<ArithShares> {
        self.check_arith(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.lshift(bits)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArithShares::from_parts(parts))
    }

    fn trunc_a(&self, x: &ArithShares, bits: usize) -> Result<ArithShares> {
        self.check_arith(x)?;
        if bits == 0 {
            return Ok(x.clone());
        }
        // Each party shifts its own share; the reconstruction is off by at
        // most one ulp except with probability ~|x| / 2^(k-1).
        let p0 = x.parts()[0].rshift(bits)?;
        let p1 = x.parts()[1].negate().rshift(bits)?.negate();
        Ok(ArithShares::from_parts(vec![p0, p1]))
    }

    fn msb_a(&self, x: &ArithShares) -> Result<BoolShares> {
        self.check_arith(x)?;
        let plain = self.reveal_a(x)?;
        let msb = plain.rshift(self.field.bits() - 1)?;
        self.share_plain_b(&msb, 1)
    }

    fn xor_bb(&self, x: &BoolShares, y: &BoolShares) -> Result<BoolShares> {
        self.check_bool(x)?;
        self.check_bool(y)?;
        let parts = x
            .parts()
            .iter()
            .zip(y.parts())
            .map(|(a, b)| Ok(a.xor(b)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, x.nbits().max(y.nbits())))
    }

    fn xor_bp(&self, x: &BoolShares, y: &RingTensor) -> Result<BoolShares> {
        self.check_bool(x)?;
        let shape = broadcast_shapes(x.shape(), y.shape())?;
        let mut parts = self.broadcast_parts(x.parts(), &shape)?;
        parts[0] = parts[0].xor(y)?;
        let nbits = x.nbits().max(sig_bits(y));
        Ok(BoolShares::from_parts(parts, nbits))
    }

    fn and_bb(&self, x: &BoolShares, y: &BoolShares) -> Result<BoolShares> {
        self.check_bool(x)?;
        self.check_bool(y)?;
        let shape = broadcast_shapes(x.shape(), y.shape())?;
        // Boolean Beaver triple: c = a & b under XOR sharing.
        let a = self.rand_tensor(&shape)?;
        let b = self.rand_tensor(&shape)?;
        let c = a.and(&b)?;
        let a_sh = self.share_plain_b(&a, self.field.bits())?;
        let b_sh = self.share_plain_b(&b, self.field.bits())?;
        let c_sh = self.share_plain_b(&c, self.field.bits())?;
        let d = self.reveal_b(x)?.xor(&a)?;
        let e = self.reveal_b(y)?.xor(&b)?;
        let mut parts = Vec::with_capacity(PARTIES);
        for i in 0..PARTIES {
            let mut z = c_sh.parts()[i]
                .xor(&d.and(&b_sh.parts()[i])?)?
                .xor(&e.and(&a_sh.parts()[i])?)?;
            if i == 0 {
                z = z.xor(&d.and(&e)?)?;
            }
            parts.push(z);
        }
        Ok(BoolShares::from_parts(parts, x.nbits().min(y.nbits())))
    }

    fn and_bp(&self, x: &BoolShares, y: &RingTensor) -> Result<BoolShares> {
        self.check_bool(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.and(y)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, x.nbits().min(sig_bits(y))))
    }

    fn lshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares> {
        self.check_bool(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.lshift(bits)?))
            .collect::<Result<Vec<_>>>()?;
        let nbits = (x.nbits() + bits).min(self.field.bits());
        Ok(BoolShares::from_parts(parts, nbits))
    }

    fn rshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares> {
        self.check_bool(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.rshift(bits)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, x.nbits().saturating_sub(bits)))
    }

    fn arshift_b(&self, x: &BoolShares, bits: usize) -> Result<BoolShares> {
        self.check_bool(x)?;
        // Sign replication is linear under XOR sharing: each party extends
        // its own sign bit and the copies cancel to the plaintext's.
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.arshift(bits)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, self.field.bits()))
    }

    fn bitrev_b(&self, x: &BoolShares, start: usize, end: usize) -> Result<BoolShares> {
        self.check_bool(x)?;
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.bitrev(start, end)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, x.nbits().max(end)))
    }

    fn bitdeintl_b(&self, x: &BoolShares) -> Result<BoolShares> {
        self.check_bool(x)?;
        let parts = x.parts().iter().map(|p| p.bitdeintl()).collect();
        Ok(BoolShares::from_parts(parts, self.field.bits()))
    }

    fn bit_parity_b(&self, x: &BoolShares, nbits: usize) -> Result<BoolShares> {
        self.check_bool(x)?;
        // Parity is an XOR reduction, so each party folds its own share.
        let parts = x
            .parts()
            .iter()
            .map(|p| Ok(p.bit_parity(nbits)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoolShares::from_parts(parts, 1))
    }

    fn prefix_or_b(&self, x: &BoolShares) -> Result<BoolShares> {
        self.check_bool(x)?;
        let plain = self.reveal_b(x)?.prefix_or();
        self.share_plain_b(&plain, x.nbits())
    }

    fn popcount_b(&self, x: &BoolShares, nbits: usize) -> Result<ArithShares> {
        self.check_bool(x)?;
        let plain = self.reveal_b(x)?.popcount(nbits)?;
        self.share_plain(&plain)
    }

    fn a2b(&self, x: &ArithShares) -> Result<BoolShares> {
        self.check_arith(x)?;
        let plain = self.reveal_a(x)?;
        self.share_plain_b(&plain, self.field.bits())
    }

    fn b2a(&self, x: &BoolShares) -> Result<ArithShares> {
        self.check_bool(x)?;
        let plain = self.reveal_b(x)?;
        self.share_plain(&plain)
    }

    fn fork(&self) -> Arc<dyn ShareEngine> {
        let seed = {
            let mut rng = self.prng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.next_u64()
        };
        Arc::new(DealerEngine::new(self.field, seed))
    }
}
