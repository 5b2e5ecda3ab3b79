//! Fixed-point encoding of reals into ring elements
//!
//! A real r is represented as the ring element floor(r * 2^f) mod 2^k, where
//! f is the fixed-point fractional-bit parameter. Values outside the
//! representable range wrap; callers are responsible for staying in domain.

use crate::field::Field;

/// Encode a real into a fixed-point ring element.
pub fn encode_f64(field: Field, fraction_bits: usize, value: f64) -> u128 {
    let scaled = (value * (fraction_bits as f64).exp2()).floor();
    field.from_signed(scaled as i128)
}

/// Decode a fixed-point ring element back to a real.
pub fn decode_f64(field: Field, fraction_bits: usize, elem: u128) -> f64 {
    field.to_signed(elem) as f64 / (fraction_bits as f64).exp2()
}

/// Encode a signed integer as an unscaled ring element.
pub fn encode_i64(field: Field, value: i64) -> u128 {
    field.from_signed(value as i128)
}
