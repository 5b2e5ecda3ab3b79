//! Fixed-point base kernels
//!
//! Arithmetic over values carrying an implicit 2^f scale. Every multiply of
//! two fixed-points is followed by exactly one truncation; multiplies with
//! an unscaled operand (signs, selector bits, raw constants) stay
//! untruncated.

use crate::constants::{constant_fxp, ring_constant};
use crate::context::Context;
use crate::error::Result;
use crate::ring::{
    ring_add, ring_arshift, ring_bitrev, ring_less, ring_lshift, ring_mmul, ring_mul, ring_mux,
    ring_negate, ring_prefix_or, ring_rshift, ring_sign, ring_sub, ring_trunc, ring_xor,
};
use crate::value::{DataType, Value};

pub(crate) fn f_add(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_add(ctx, x, y)?.as_fxp())
}

pub(crate) fn f_sub(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_sub(ctx, x, y)?.as_fxp())
}

pub(crate) fn f_negate(ctx: &Context, x: &Value) -> Result<Value> {
    Ok(ring_negate(ctx, x)?.as_fxp())
}

/// Fixed-point product: ring multiply, then rescale by f.
pub(crate) fn f_mul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let raw = ring_mul(ctx, x, y)?;
    Ok(ring_trunc(ctx, &raw, ctx.fxp_bits())?.as_fxp())
}

/// Fixed-point matrix product with a single rescale.
pub(crate) fn f_mmul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let raw = ring_mmul(ctx, x, y)?;
    Ok(ring_trunc(ctx, &raw, ctx.fxp_bits())?.as_fxp())
}

/// Squaring, tracked separately so engines may specialise it.
pub(crate) fn f_square(ctx: &Context, x: &Value) -> Result<Value> {
    f_mul(ctx, x, x)
}

pub(crate) fn f_abs(ctx: &Context, x: &Value) -> Result<Value> {
    let sign = ring_sign(ctx, x)?;
    Ok(ring_mul(ctx, x, &sign)?.as_fxp())
}

/// Drop the fractional part, rounding toward negative infinity.
pub(crate) fn f_floor(ctx: &Context, x: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();
    Ok(ring_lshift(ctx, &ring_arshift(ctx, x, f)?, f)?.as_fxp())
}

pub(crate) fn f_ceil(ctx: &Context, x: &Value) -> Result<Value> {
    // ceil(x) = floor(x + 1 - 2^-f)
    let f = ctx.fxp_bits();
    let almost_one = ring_constant(ctx, (1u128 << f) - 1, x.shape()).as_fxp();
    f_floor(ctx, &f_add(ctx, x, &almost_one)?)
}

pub(crate) fn f_less(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_less(ctx, x, y)?.with_dtype(DataType::I8))
}

/// Equality from two comparisons; the engine exposes no direct test.
pub(crate) fn f_equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let one = ring_constant(ctx, 1, x.shape());
    let not_lt = ring_sub(ctx, &one, &ring_less(ctx, x, y)?)?;
    let not_gt = ring_sub(ctx, &one, &ring_less(ctx, y, x)?)?;
    Ok(ring_mul(ctx, &not_lt, &not_gt)?.with_dtype(DataType::I8))
}

/// Keep only the highest set bit of each element.
pub(crate) fn highest_one_bit(ctx: &Context, x: &Value) -> Result<Value> {
    let p = ring_prefix_or(ctx, x)?;
    let shifted = ring_rshift(ctx, &p, 1)?;
    ring_xor(ctx, &p, &shifted)
}

/// Sum of c_i * x^i for i = 1..=n; the caller adds any constant term.
///
/// Powers are rescaled as they are built, but each term enters the sum
/// unscaled so one final truncation covers the whole polynomial.
pub(crate) fn f_polynomial(ctx: &Context, x: &Value, coeffs: &[Value]) -> Result<Value> {
    debug_assert!(!coeffs.is_empty());
    let mut x_pow = x.clone();
    let mut sum = ring_mul(ctx, &x_pow, &coeffs[0])?;
    for c in &coeffs[1..] {
        x_pow = f_mul(ctx, &x_pow, x)?;
        sum = ring_add(ctx, &sum, &ring_mul(ctx, &x_pow, c)?)?;
    }
    Ok(ring_trunc(ctx, &sum, ctx.fxp_bits())?.as_fxp())
}

/// Goldschmidt quotient a / b for b > 0; callers normalise signs.
///
/// b is scaled into [0.5, 1) by the bit-reversed highest-one-bit factor,
/// the reciprocal is seeded with the linear estimate 2.9142 - 2c and
/// refined quadratically for the configured number of iterations.
pub(crate) fn div_goldschmidt(ctx: &Context, a: &Value, b: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();

    let b_msb = highest_one_bit(ctx, b)?;
    let factor = ring_bitrev(ctx, &b_msb, 0, 2 * f)?
        .hint_nbits(2 * f)
        .as_fxp();

    let c = f_mul(ctx, b, &factor)?;
    let numer = f_mul(ctx, a, &factor)?;

    let one = constant_fxp(ctx, 1.0, b.shape());
    let w0 = f_sub(
        ctx,
        &constant_fxp(ctx, 2.9142, b.shape()),
        &f_add(ctx, &c, &c)?,
    )?;
    let mut e = f_sub(ctx, &one, &f_mul(ctx, &c, &w0)?)?;
    let mut q = f_mul(ctx, &numer, &w0)?;

    for _ in 0..ctx.config().fxp_div_goldschmidt_iters {
        q = f_mul(ctx, &q, &f_add(ctx, &e, &one)?)?;
        e = f_square(ctx, &e)?;
    }

    Ok(q)
}

/// Fixed-point division; the divisor's sign is stripped before the
/// Goldschmidt iteration and re-applied to the quotient. Division by zero
/// is not detected.
pub(crate) fn f_div(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let sign_y = ring_sign(ctx, y)?;
    let abs_y = ring_mul(ctx, y, &sign_y)?.as_fxp();
    let q = div_goldschmidt(ctx, x, &abs_y)?;
    Ok(ring_mul(ctx, &q, &sign_y)?.as_fxp())
}

pub(crate) fn f_reciprocal(ctx: &Context, x: &Value) -> Result<Value> {
    let one = constant_fxp(ctx, 1.0, x.shape());
    f_div(ctx, &one, x)
}

/// min(max(lo, x), hi) via two compare-select rounds.
pub(crate) fn f_clamp(ctx: &Context, x: &Value, lo: &Value, hi: &Value) -> Result<Value> {
    let lower = ring_mux(ctx, &f_less(ctx, x, lo)?, lo, x)?;
    Ok(ring_mux(ctx, &f_less(ctx, hi, &lower)?, hi, &lower)?.as_fxp())
}
