//! Mod-2^k ring tensors
//!
//! A `RingTensor` is a flat, row-major tensor of ring elements with a shape
//! and a field tag. All arithmetic wraps mod 2^k; binary operations
//! broadcast their operands to a common shape (NumPy-style, right-aligned).
//! Zero-length operands produce zero-length results.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{Result, RingError};
use crate::field::Field;

/// Compute the common broadcast shape of two shapes, or fail.
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let rank = lhs.len().max(rhs.len());
    let mut out = vec![0usize; rank];
    for i in 0..rank {
        let l = if i < rank - lhs.len() { 1 } else { lhs[i - (rank - lhs.len())] };
        let r = if i < rank - rhs.len() { 1 } else { rhs[i - (rank - rhs.len())] };
        out[i] = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return Err(RingError::ShapeMismatch {
                lhs: lhs.to_vec(),
                rhs: rhs.to_vec(),
            });
        };
    }
    Ok(out)
}

/// Row-major strides of `shape`, right-aligned to `rank` dims, with stride 0
/// on broadcast (size-1 or missing) dims.
fn broadcast_strides(shape: &[usize], rank: usize) -> Vec<usize> {
    let mut strides = vec![0usize; rank];
    let mut stride = 1usize;
    for (i, &dim) in shape.iter().enumerate().rev() {
        let out_i = rank - shape.len() + i;
        strides[out_i] = if dim == 1 { 0 } else { stride };
        stride *= dim;
    }
    strides
}

/// A tensor of ring elements mod 2^k.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingTensor {
    field: Field,
    shape: Vec<usize>,
    elems: Vec<u128>,
}

impl Zeroize for RingTensor {
    fn zeroize(&mut self) {
        self.elems.zeroize();
    }
}

impl RingTensor {
    /// Build a tensor from raw elements (masked to the field width).
    pub fn from_raw(field: Field, shape: Vec<usize>, elems: Vec<u128>) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if elems.len() != numel {
            return Err(RingError::DimensionMismatch {
                expected: numel,
                got: elems.len(),
            });
        }
        let mask = field.mask();
        let elems = elems.into_iter().map(|e| e & mask).collect();
        Ok(Self { field, shape, elems })
    }

    /// All-zero tensor.
    pub fn zeros(field: Field, shape: Vec<usize>) -> Self {
        let numel = shape.iter().product();
        Self {
            field,
            shape,
            elems: vec![0; numel],
        }
    }

    /// Every element set to `value` (masked).
    pub fn splat(field: Field, shape: Vec<usize>, value: u128) -> Self {
        let numel = shape.iter().product();
        Self {
            field,
            shape,
            elems: vec![value & field.mask(); numel],
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn elems(&self) -> &[u128] {
        &self.elems
    }

    /// Reinterpret the same elements under a new shape with equal length.
    pub fn reshape(mut self, shape: Vec<usize>) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != self.elems.len() {
            return Err(RingError::DimensionMismatch {
                expected: self.elems.len(),
                got: numel,
            });
        }
        self.shape = shape;
        Ok(self)
    }

    fn check_field(&self, other: &Self) -> Result<()> {
        if self.field != other.field {
            return Err(RingError::FieldMismatch {
                lhs: self.field,
                rhs: other.field,
            });
        }
        Ok(())
    }

    fn check_shift(&self, bits: usize) -> Result<()> {
        if bits >= self.field.bits() {
            return Err(RingError::ShiftOutOfRange {
                field: self.field,
                bits,
            });
        }
        Ok(())
    }

    /// Element-wise combine with broadcasting.
    pub fn zip_with<F>(&self, other: &Self, f: F) -> Result<Self>
    where
        F: Fn(u128, u128) -> u128,
    {
        self.check_field(other)?;
        let out_shape = broadcast_shapes(&self.shape, &other.shape)?;
        let rank = out_shape.len();
        let numel: usize = out_shape.iter().product();
        let mask = self.field.mask();

        // Fast path: identical shapes need no index arithmetic.
        if self.shape == other.shape {
            let elems = self
                .elems
                .iter()
                .zip(&other.elems)
                .map(|(&a, &b)| f(a, b) & mask)
                .collect();
            return Ok(Self {
                field: self.field,
                shape: out_shape,
                elems,
            });
        }

        let ls = broadcast_strides(&self.shape, rank);
        let rs = broadcast_strides(&other.shape, rank);
        let mut elems = Vec::with_capacity(numel);
        let mut coords = vec![0usize; rank];
        let mut li = 0usize;
        let mut ri = 0usize;
        for _ in 0..numel {
            elems.push(f(self.elems[li], other.elems[ri]) & mask);
            // Advance the odometer and the two flat indices together.
            for d in (0..rank).rev() {
                coords[d] += 1;
                li += ls[d];
                ri += rs[d];
                if coords[d] < out_shape[d] {
                    break;
                }
                li -= ls[d] * out_shape[d];
                ri -= rs[d] * out_shape[d];
                coords[d] = 0;
            }
        }
        Ok(Self {
            field: self.field,
            shape: out_shape,
            elems,
        })
    }

    /// Element-wise map.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(u128) -> u128,
    {
        let mask = self.field.mask();
        Self {
            field: self.field,
            shape: self.shape.clone(),
            elems: self.elems.iter().map(|&e| f(e) & mask).collect(),
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a.wrapping_add(b))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a.wrapping_sub(b))
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a.wrapping_mul(b))
    }

    pub fn negate(&self) -> Self {
        self.map(|e| e.wrapping_neg())
    }

    /// In-place negation.
    pub fn neg_in_place(&mut self) {
        let mask = self.field.mask();
        for e in &mut self.elems {
            *e = e.wrapping_neg() & mask;
        }
    }

    pub fn and(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a ^ b)
    }

    pub fn not(&self) -> Self {
        self.map(|e| !e)
    }

    /// Logical left shift within the field width.
    pub fn lshift(&self, bits: usize) -> Result<Self> {
        self.check_shift(bits)?;
        Ok(self.map(|e| e << bits))
    }

    /// Logical right shift within the field width.
    pub fn rshift(&self, bits: usize) -> Result<Self> {
        self.check_shift(bits)?;
        Ok(self.map(|e| e >> bits))
    }

    /// Arithmetic right shift: the field's sign bit is replicated.
    pub fn arshift(&self, bits: usize) -> Result<Self> {
        self.check_shift(bits)?;
        let k = self.field.bits();
        let sign_bit = 1u128 << (k - 1);
        let fill = if bits == 0 {
            0
        } else {
            // `bits` high bits of the field, to paste over the vacated span.
            ((1u128 << bits) - 1) << (k - bits)
        };
        Ok(self.map(|e| {
            let shifted = e >> bits;
            if e & sign_bit != 0 {
                shifted | fill
            } else {
                shifted
            }
        }))
    }

    /// Reverse the bit range `start..end`; bits outside the range keep their
    /// positions.
    pub fn bitrev(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.field.bits() {
            return Err(RingError::BitRangeInvalid {
                field: self.field,
                start,
                end,
            });
        }
        Ok(self.map(|e| {
            let mut out = e;
            for i in start..end {
                let j = start + end - 1 - i;
                let bit = (e >> i) & 1;
                out = (out & !(1u128 << j)) | (bit << j);
            }
            out
        }))
    }

    /// XOR-reduce the low `nbits` bits of each element to a single bit.
    pub fn bit_parity(&self, nbits: usize) -> Result<Self> {
        if nbits > self.field.bits() {
            return Err(RingError::BitRangeInvalid {
                field: self.field,
                start: 0,
                end: nbits,
            });
        }
        let mask = if nbits == 128 { u128::MAX } else { (1u128 << nbits) - 1 };
        Ok(self.map(|e| ((e & mask).count_ones() & 1) as u128))
    }

    /// Count the set bits among the low `nbits` bits.
    pub fn popcount(&self, nbits: usize) -> Result<Self> {
        if nbits > self.field.bits() {
            return Err(RingError::BitRangeInvalid {
                field: self.field,
                start: 0,
                end: nbits,
            });
        }
        let mask = if nbits == 128 { u128::MAX } else { (1u128 << nbits) - 1 };
        Ok(self.map(|e| (e & mask).count_ones() as u128))
    }

    /// Bit i of the result is the OR of bits i..k of the input, so the bits
    /// below the highest set bit all become one.
    pub fn prefix_or(&self) -> Self {
        let k = self.field.bits();
        self.map(|e| {
            let mut v = e;
            let mut s = 1;
            while s < k {
                v |= v >> s;
                s <<= 1;
            }
            v
        })
    }

    /// Keep only the highest set bit of each element.
    pub fn highest_one_bit(&self) -> Self {
        let p = self.prefix_or();
        // For a prefix-or pattern, xor with its shift isolates the top bit.
        p.map(|e| e ^ (e >> 1))
    }

    /// De-interleave bits: even positions move to the low half of the word,
    /// odd positions to the high half.
    pub fn bitdeintl(&self) -> Self {
        let k = self.field.bits();
        let half = k / 2;
        self.map(|e| {
            let mut lo = 0u128;
            let mut hi = 0u128;
            for i in 0..half {
                lo |= ((e >> (2 * i)) & 1) << i;
                hi |= ((e >> (2 * i + 1)) & 1) << i;
            }
            lo | (hi << half)
        })
    }

    /// 2-D matrix multiply: `[m, n] x [n, p] -> [m, p]`.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        self.check_field(other)?;
        if self.shape.len() != 2 || other.shape.len() != 2 {
            return Err(RingError::NotMatrices {
                lhs: self.shape.len(),
                rhs: other.shape.len(),
            });
        }
        let (m, n) = (self.shape[0], self.shape[1]);
        let (n2, p) = (other.shape[0], other.shape[1]);
        if n != n2 {
            return Err(RingError::DimensionMismatch { expected: n, got: n2 });
        }
        let mask = self.field.mask();
        let mut elems = vec![0u128; m * p];
        for i in 0..m {
            for l in 0..n {
                let a = self.elems[i * n + l];
                for j in 0..p {
                    let b = other.elems[l * p + j];
                    let acc = &mut elems[i * p + j];
                    *acc = acc.wrapping_add(a.wrapping_mul(b)) & mask;
                }
            }
        }
        Ok(Self {
            field: self.field,
            shape: vec![m, p],
            elems,
        })
    }
}
