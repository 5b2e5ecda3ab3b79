//! Fixed-point transcendental approximations
//!
//! Polynomial and iterative approximations of log, exp, tanh, sqrt, rsqrt
//! and sigmoid over secret-shared fixed-point tensors. Every internal
//! multiply follows the truncation discipline of the base kernels; inputs
//! outside a function's stated domain produce undefined results rather
//! than errors.
//!
//! The exp and log entries short-circuit public operands to cleartext
//! evaluation; the rest run their pipeline on public ring values so that
//! mode selection behaves the same in every share domain.

use tracing::trace;

use crate::config::{ExpMode, LogMode, SigmoidMode};
use crate::constants::{constant_fxp, constant_fxp_slice, decode_fxp, ring_constant};
use crate::context::Context;
use crate::error::{HalError, Result};
use crate::fxp::{
    div_goldschmidt, f_add, f_clamp, f_less, f_mul, f_negate, f_polynomial, f_square, f_sub,
    highest_one_bit,
};
use crate::ring::{
    prefer_a, prefer_b, ring_add, ring_and, ring_bit_parity, ring_bitdeintl, ring_bitrev,
    ring_lshift, ring_mul, ring_mux, ring_popcount, ring_prefix_or, ring_rshift, ring_sub,
    ring_trunc, ring_xor,
};
use crate::value::Value;

fn ensure_fxp(op: &'static str, x: &Value) -> Result<()> {
    if !x.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op,
            dtype: x.dtype(),
        });
    }
    Ok(())
}

/// Plaintext path for public operands.
fn apply_cleartext<F>(ctx: &Context, x: &Value, f: F) -> Result<Value>
where
    F: Fn(f64) -> f64,
{
    let vals = decode_fxp(ctx, x)?;
    let out: Vec<f64> = vals.into_iter().map(f).collect();
    constant_fxp_slice(ctx, &out, x.shape())
}

// Pade approximation of log2 on [0.5, 1):
//   log2(x) = p2524(x) / q2524(x)
fn log2_pade_normalized(ctx: &Context, x: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();
    let x2 = f_square(ctx, x)?;
    let x3 = f_mul(ctx, &x2, x)?;

    let p0 = constant_fxp(ctx, -2.05466671951, x.shape());
    let p1 = constant_fxp(ctx, -8.8626599391, x.shape());
    let p2 = constant_fxp(ctx, 6.10585199015, x.shape());
    let p3 = constant_fxp(ctx, 4.81147460989, x.shape());

    let q0 = constant_fxp(ctx, 0.353553425277, x.shape());
    let q1 = constant_fxp(ctx, 4.54517087629, x.shape());
    let q2 = constant_fxp(ctx, 6.42784209029, x.shape());
    let q3 = constant_fxp(ctx, 1.0, x.shape());

    let mut p = ring_mul(ctx, x, &p1)?;
    p = ring_add(ctx, &p, &ring_mul(ctx, &x2, &p2)?)?;
    p = ring_add(ctx, &p, &ring_mul(ctx, &x3, &p3)?)?;
    let p = ring_add(ctx, &ring_trunc(ctx, &p, f)?, &p0)?.as_fxp();

    let mut q = ring_mul(ctx, x, &q1)?;
    q = ring_add(ctx, &q, &ring_mul(ctx, &x2, &q2)?)?;
    q = ring_add(ctx, &q, &ring_mul(ctx, &x3, &q3)?)?;
    let q = ring_add(ctx, &ring_trunc(ctx, &q, f)?, &q0)?.as_fxp();

    div_goldschmidt(ctx, &p, &q)
}

// Normalise x into [0.5, 1) by the bit-reversed highest-one-bit factor and
// shift the exponent back in afterwards.
fn log2_pade(ctx: &Context, x: &Value) -> Result<Value> {
    let bit_width = ctx.field().bits();
    let f = ctx.fxp_bits();

    // Number of significant bits of x.
    let k = ring_popcount(ctx, &ring_prefix_or(ctx, x)?, bit_width)?;

    // x = norm * factor with norm in [0.5, 1).
    let msb = highest_one_bit(ctx, x)?;
    let factor = ring_bitrev(ctx, &msb, 0, 2 * f)?.hint_nbits(2 * f).as_fxp();
    let norm = f_mul(ctx, x, &factor)?;

    // log2(x) = log2(norm) + (k - f)
    let correction = ring_lshift(
        ctx,
        &ring_sub(ctx, &k, &ring_constant(ctx, f as u128, x.shape()))?,
        f,
    )?;
    Ok(ring_add(ctx, &log2_pade_normalized(ctx, &norm)?, &correction)?.as_fxp())
}

// Modified Householder iterations, accurate within ~2% relative error on
// [1e-4, 250]. Seed: y0 = x/120 - 20 exp(-2x - 1) + 3.
fn log_householder(ctx: &Context, x: &Value) -> Result<Value> {
    let shape = x.shape();
    let term_1 = crate::fxp::f_div(ctx, x, &constant_fxp(ctx, 120.0, shape))?;
    let exponent = f_negate(
        ctx,
        &f_add(
            ctx,
            &f_mul(ctx, x, &constant_fxp(ctx, 2.0, shape))?,
            &constant_fxp(ctx, 1.0, shape),
        )?,
    )?;
    let term_2 = f_mul(ctx, &f_exp(ctx, &exponent)?, &constant_fxp(ctx, 20.0, shape))?;
    let mut y = f_add(
        ctx,
        &f_sub(ctx, &term_1, &term_2)?,
        &constant_fxp(ctx, 3.0, shape),
    )?;

    let orders = ctx.config().fxp_log_orders;
    let coeffs: Vec<Value> = (0..orders)
        .map(|i| constant_fxp(ctx, 1.0 / (1.0 + i as f64), shape))
        .collect();

    let one = constant_fxp(ctx, 1.0, shape);
    for _ in 0..ctx.config().fxp_log_iters {
        let h = f_sub(
            ctx,
            &one,
            &f_mul(ctx, x, &f_exp(ctx, &f_negate(ctx, &y)?)?)?,
        )?;
        y = f_sub(ctx, &y, &f_polynomial(ctx, &h, &coeffs)?)?;
    }
    Ok(y)
}

// exp(x) = lim (1 + x/2^n)^(2^n)
fn exp_taylor(ctx: &Context, x: &Value) -> Result<Value> {
    let iters = ctx.config().fxp_exp_iters;
    let scaled = ring_trunc(ctx, x, iters)?.as_fxp();
    let mut res = f_add(ctx, &scaled, &constant_fxp(ctx, 1.0, x.shape()))?;
    for _ in 0..iters {
        res = f_square(ctx, &res)?;
    }
    Ok(res)
}

// Pade quintic for exp2 on [0, 1).
fn exp2_pade_positive_decimal(ctx: &Context, x: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();
    let x2 = f_mul(ctx, x, x)?;
    let x3 = f_mul(ctx, x, &x2)?;
    let x4 = f_mul(ctx, x, &x3)?;
    let x5 = f_mul(ctx, x, &x4)?;

    let p0 = constant_fxp(ctx, 1.00000007744302, x.shape());
    let p1 = constant_fxp(ctx, 0.693147180426163, x.shape());
    let p2 = constant_fxp(ctx, 0.240226510710170, x.shape());
    let p3 = constant_fxp(ctx, 0.0555040686204663, x.shape());
    let p4 = constant_fxp(ctx, 0.00961834122588046, x.shape());
    let p5 = constant_fxp(ctx, 0.00133273035928143, x.shape());

    let mut res = ring_mul(ctx, x, &p1)?;
    res = ring_add(ctx, &res, &ring_mul(ctx, &x2, &p2)?)?;
    res = ring_add(ctx, &res, &ring_mul(ctx, &x3, &p3)?)?;
    res = ring_add(ctx, &res, &ring_mul(ctx, &x4, &p4)?)?;
    res = ring_add(ctx, &res, &ring_mul(ctx, &x5, &p5)?)?;
    Ok(ring_add(ctx, &ring_trunc(ctx, &res, f)?, &p0)?.as_fxp())
}

// exp2 for inputs with at most 5 integer bits; larger integer parts give
// undefined results.
fn exp2_pade(ctx: &Context, x: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();
    let bit_width = ctx.field().bits();
    let int_bits = 5usize;
    let k1 = ring_constant(ctx, 1, x.shape());

    let x_b = prefer_b(ctx, x)?;
    let x_msb = ring_rshift(ctx, &x_b, bit_width - 1)?;
    let x_int = ring_rshift(ctx, &x_b, f)?;
    let x_frac = ring_sub(ctx, x, &ring_lshift(ctx, &x_int, f)?)?.as_fxp();

    let mut ret = exp2_pade_positive_decimal(ctx, &x_frac)?;

    // Multiply in 2^(2^j) for every set integer bit j.
    for idx in 0..int_bits {
        let a = ring_and(ctx, &ring_rshift(ctx, &x_int, idx)?, &k1)?.hint_nbits(1);
        let a = prefer_a(ctx, &a)?;
        let pow = 1u128 << (1usize << idx).min(bit_width - 2);
        let scale = ring_constant(ctx, pow, x.shape());
        let selected = ring_add(
            ctx,
            &ring_mul(ctx, &a, &scale)?,
            &ring_sub(ctx, &k1, &a)?,
        )?;
        ret = ring_mul(ctx, &ret, &selected)?.as_fxp();
    }

    // For x < 0 the complement identity exp2(x_hat)/2^32 = exp2(-|x|)
    // turns the positive-branch result into the reciprocal branch.
    let ret_reciprocal = ring_trunc(ctx, &ret, 1usize << int_bits)?.as_fxp();
    let adjustment = ring_mul(ctx, &x_msb, &f_sub(ctx, &ret_reciprocal, &ret)?)?.as_fxp();
    f_add(ctx, &ret, &adjustment)
}

fn exp_pade(ctx: &Context, x: &Value) -> Result<Value> {
    let log2_e = constant_fxp(ctx, std::f64::consts::LOG2_E, x.shape());
    exp2_pade(ctx, &f_mul(ctx, x, &log2_e)?)
}

// Pade 5/5:
//   tanh(x) = (x + x^3/9 + x^5/945) / (1 + 4x^2/9 + x^4/63)
fn tanh_pade(ctx: &Context, x: &Value) -> Result<Value> {
    let shape = x.shape();
    let x2 = f_square(ctx, x)?;
    let x3 = f_mul(ctx, &x2, x)?;
    let x4 = f_square(ctx, &x2)?;
    let x5 = f_mul(ctx, &x2, &x3)?;

    let dividend = f_add(
        ctx,
        x,
        &f_add(
            ctx,
            &crate::fxp::f_div(ctx, &x3, &constant_fxp(ctx, 9.0, shape))?,
            &crate::fxp::f_div(ctx, &x5, &constant_fxp(ctx, 945.0, shape))?,
        )?,
    )?;

    let divisor = f_add(
        ctx,
        &constant_fxp(ctx, 1.0, shape),
        &f_add(
            ctx,
            &crate::fxp::f_div(ctx, &x2, &constant_fxp(ctx, 9.0 / 4.0, shape))?,
            &crate::fxp::f_div(ctx, &x4, &constant_fxp(ctx, 63.0, shape))?,
        )?,
    )?;

    crate::fxp::f_div(ctx, &dividend, &divisor)
}

// Initial rsqrt guess: scale x into u in [0.25, 0.5) and evaluate the seed
// polynomial there.
fn rsqrt_init_guess(ctx: &Context, x: &Value, z: &Value) -> Result<Value> {
    let f = ctx.fxp_bits();

    let z_rev = ring_bitrev(ctx, z, 0, 2 * f)?.hint_nbits(2 * f);
    let u = ring_trunc(ctx, &ring_mul(ctx, x, &z_rev)?, f)?.as_fxp();

    if !ctx.config().enable_lower_accuracy_rsqrt {
        let coeffs: Vec<Value> = [-15.47994394, 38.4714796, -49.86605845, 26.02942339]
            .iter()
            .map(|&c| constant_fxp(ctx, c, x.shape()))
            .collect();
        f_add(
            ctx,
            &f_polynomial(ctx, &u, &coeffs)?,
            &constant_fxp(ctx, 4.14285016, x.shape()),
        )
    } else {
        let coeffs: Vec<Value> = [-5.9417, 4.7979]
            .iter()
            .map(|&c| constant_fxp(ctx, c, x.shape()))
            .collect();
        f_add(
            ctx,
            &f_polynomial(ctx, &u, &coeffs)?,
            &constant_fxp(ctx, 3.1855, x.shape()),
        )
    }
}

// Compensation factor 2^(-(e-1)/2) from the bits of z = 2^(e+f), derived by
// de-interleaving the even/odd bit positions (Lu et al., LSB variant).
fn rsqrt_comp(ctx: &Context, x: &Value, z: &Value) -> Result<Value> {
    let k = ctx.field().bits();
    let f = ctx.fxp_bits();

    // a has its single bit at floor((e+f)/2); b tells whether e+f is even.
    let z_sep = ring_bitdeintl(ctx, z)?;
    let lo_mask = ring_constant(ctx, (1u128 << (k / 2)) - 1, x.shape());
    let z_even = ring_and(ctx, &z_sep, &lo_mask)?;
    let z_odd = ring_and(ctx, &ring_rshift(ctx, &z_sep, k / 2)?, &lo_mask)?;
    let a = ring_xor(ctx, &z_odd, &z_even)?;
    let b = ring_bit_parity(ctx, &z_even, k / 2)?.hint_nbits(1);

    let a_rev = ring_bitrev(ctx, &a, 0, (f / 2) * 2)?.hint_nbits((f / 2) * 2);

    // Constant pair per parity of f; the selected one is multiplied by the
    // reversed-bit factor.
    let (c0, c1) = if f % 2 == 1 {
        (
            ring_constant(ctx, 1u128 << ((f + 3) / 2), x.shape()),
            ring_constant(
                ctx,
                ((1u128 << (f / 2 + 1)) as f64 * std::f64::consts::SQRT_2) as u128,
                x.shape(),
            ),
        )
    } else {
        (
            ring_constant(
                ctx,
                ((1u128 << (f / 2)) as f64 * std::f64::consts::SQRT_2) as u128,
                x.shape(),
            ),
            ring_constant(ctx, 1u128 << (f / 2), x.shape()),
        )
    };

    ring_mul(ctx, &ring_mux(ctx, &b, &c0, &c1)?, &a_rev)
}

// z = 2^(e+f) where 2^e is the next power of two above x.
fn rsqrt_np2(ctx: &Context, x: &Value) -> Result<Value> {
    ring_lshift(ctx, &highest_one_bit(ctx, x)?, 1)
}

/// 1/sqrt(x) for x > 0.
pub(crate) fn f_rsqrt(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("rsqrt", x)?;
    trace!(shape = ?x.shape(), "rsqrt");

    let f = ctx.fxp_bits();
    let z = rsqrt_np2(ctx, x)?;

    let (guess, comp) = if ctx.config().experimental_enable_intra_op_par {
        let sub_ctx = ctx.fork();
        let (guess, comp) = rayon::join(
            || rsqrt_init_guess(&sub_ctx, x, &z),
            || rsqrt_comp(ctx, x, &z),
        );
        (guess?, comp?)
    } else {
        (rsqrt_init_guess(ctx, x, &z)?, rsqrt_comp(ctx, x, &z)?)
    };

    Ok(ring_trunc(ctx, &ring_mul(ctx, &guess, &comp)?, f)?.as_fxp())
}

/// sqrt(x) for x >= 0, one Goldschmidt iteration over the rsqrt seed.
pub(crate) fn f_sqrt(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("sqrt", x)?;

    let c0 = constant_fxp(ctx, 0.5, x.shape());
    let c1 = constant_fxp(ctx, 1.5, x.shape());

    let y0 = f_rsqrt(ctx, x)?;
    let mut g = f_mul(ctx, x, &y0)?;
    let mut h = f_mul(ctx, &y0, &c0)?;

    // One iteration is enough on top of the rsqrt seed.
    for _ in 0..1 {
        let r = f_sub(ctx, &c1, &f_mul(ctx, &g, &h)?)?;
        g = f_mul(ctx, &g, &r)?;
        h = f_mul(ctx, &h, &r)?;
    }

    Ok(g)
}

/// e^x under the configured approximation mode.
pub(crate) fn f_exp(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("exp", x)?;
    if x.is_public() {
        return apply_cleartext(ctx, x, f64::exp);
    }

    match ctx.config().fxp_exp_mode {
        ExpMode::Default | ExpMode::Taylor => exp_taylor(ctx, x),
        ExpMode::Pade => {
            // The Pade path is only valid within 5 integer bits of exp2.
            let limit = 32.0 / std::f64::consts::LOG2_E;
            let clamped = f_clamp(
                ctx,
                x,
                &constant_fxp(ctx, -limit, x.shape()),
                &constant_fxp(ctx, limit, x.shape()),
            )?;
            exp_pade(ctx, &clamped)
        }
    }
}

/// 2^x; the integer part of x must fit in 5 bits, larger magnitudes are
/// undefined.
pub(crate) fn f_exp2(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("exp2", x)?;
    exp2_pade(ctx, x)
}

/// Natural log under the configured mode. x <= 0 silently yields a
/// nonsense value.
pub(crate) fn f_log(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("log", x)?;
    if x.is_public() {
        return apply_cleartext(ctx, x, f64::ln);
    }

    match ctx.config().fxp_log_mode {
        LogMode::Default | LogMode::Pade => f_mul(
            ctx,
            &constant_fxp(ctx, std::f64::consts::LN_2, x.shape()),
            &f_log2(ctx, x)?,
        ),
        LogMode::Newton => log_householder(ctx, x),
    }
}

/// log2(x) for x > 0.
pub(crate) fn f_log2(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("log2", x)?;
    Ok(log2_pade(ctx, x)?.as_fxp())
}

/// log(1 + x)
pub(crate) fn f_log1p(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("log1p", x)?;
    f_log(ctx, &f_add(ctx, &constant_fxp(ctx, 1.0, x.shape()), x)?)
}

/// tanh on the clamped domain [-3, 3]; the polymorphic entry saturates
/// inputs beyond it.
pub(crate) fn f_tanh(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("tanh", x)?;
    tanh_pade(ctx, x)
}

fn sigmoid_mm1(ctx: &Context, x: &Value) -> Result<Value> {
    let c1 = constant_fxp(ctx, 0.5, x.shape());
    let c2 = constant_fxp(ctx, 0.125, x.shape());
    f_add(ctx, &c1, &f_mul(ctx, &c2, x)?)
}

fn sigmoid_seg3(ctx: &Context, x: &Value) -> Result<Value> {
    let upper = constant_fxp(ctx, 1.0, x.shape());
    let lower = constant_fxp(ctx, 0.0, x.shape());
    let middle = sigmoid_mm1(ctx, x)?;

    let upper_bound = constant_fxp(ctx, 4.0, x.shape());
    let lower_bound = constant_fxp(ctx, -4.0, x.shape());

    let ret = ring_mux(ctx, &f_less(ctx, &upper_bound, x)?, &upper, &middle)?;
    Ok(ring_mux(ctx, &f_less(ctx, x, &lower_bound)?, &lower, &ret)?.as_fxp())
}

fn sigmoid_real(ctx: &Context, x: &Value) -> Result<Value> {
    let one = constant_fxp(ctx, 1.0, x.shape());
    let denom = f_add(ctx, &one, &f_exp(ctx, &f_negate(ctx, x)?)?)?;
    crate::fxp::f_reciprocal(ctx, &denom)
}

/// Sigmoid under the configured mode.
pub(crate) fn f_sigmoid(ctx: &Context, x: &Value) -> Result<Value> {
    ensure_fxp("sigmoid", x)?;

    match ctx.config().sigmoid_mode {
        SigmoidMode::Default | SigmoidMode::Mm1 => sigmoid_mm1(ctx, x),
        SigmoidMode::Seg3 => sigmoid_seg3(ctx, x),
        SigmoidMode::Real => sigmoid_real(ctx, x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::constants::constant_fxp_slice;
    use crate::type_cast::{reveal, seal};
    use mantle_engine::DealerEngine;
    use mantle_ring::Field;
    use std::sync::Arc;

    fn ctx_with(config: RuntimeConfig) -> Context {
        let field = config.field;
        Context::new(config, Arc::new(DealerEngine::new(field, 1234))).unwrap()
    }

    fn ctx() -> Context {
        ctx_with(RuntimeConfig::default())
    }

    fn secret(ctx: &Context, values: &[f64]) -> Value {
        let v = constant_fxp_slice(ctx, values, &[values.len()]).unwrap();
        seal(ctx, &v).unwrap()
    }

    fn open(ctx: &Context, v: &Value) -> Vec<f64> {
        decode_fxp(ctx, &reveal(ctx, v).unwrap()).unwrap()
    }

    fn assert_rel(got: &[f64], want: &[f64], rel: f64) {
        for (g, w) in got.iter().zip(want) {
            let tol = w.abs() * rel + 1e-4;
            assert!((g - w).abs() <= tol, "got {g}, want {w} (rel {rel})");
        }
    }

    fn assert_abs(got: &[f64], want: &[f64], tol: f64) {
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() <= tol, "got {g}, want {w} (tol {tol})");
        }
    }

    #[test]
    fn test_log2_on_powers_of_two() {
        let ctx = ctx();
        let x = secret(&ctx, &[16.0, 1.0, 0.25]);
        let out = open(&ctx, &f_log2(&ctx, &x).unwrap());
        assert_abs(&out, &[4.0, 0.0, -2.0], 0.02);
    }

    #[test]
    fn test_log_pade_accuracy() {
        let ctx = ctx();
        let inputs = [0.001, 0.1, 1.0, 2.0, 16.0, 100.0, 250.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_log(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.ln()).collect();
        assert_rel(&out, &want, 0.02);
    }

    #[test]
    fn test_log_newton_mode() {
        let config = RuntimeConfig {
            fxp_log_mode: LogMode::Newton,
            ..Default::default()
        };
        let ctx = ctx_with(config);
        let inputs = [0.5, 1.0, 4.0, 50.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_log(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.ln()).collect();
        assert_rel(&out, &want, 0.02);
    }

    #[test]
    fn test_log1p() {
        let ctx = ctx();
        let x = secret(&ctx, &[0.0, 1.0, 9.0]);
        let out = open(&ctx, &f_log1p(&ctx, &x).unwrap());
        assert_rel(&out, &[0.0, 2f64.ln(), 10f64.ln()], 0.02);
    }

    #[test]
    fn test_log_public_shortcut_is_exact() {
        let ctx = ctx();
        let x = constant_fxp_slice(&ctx, &[2.0, 5.0], &[2]).unwrap();
        let out = decode_fxp(&ctx, &f_log(&ctx, &x).unwrap()).unwrap();
        assert_abs(&out, &[2f64.ln(), 5f64.ln()], 1e-5);
    }

    #[test]
    fn test_exp_taylor_moderate_range() {
        let ctx = ctx();
        let inputs = [-2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_exp(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.exp()).collect();
        assert_rel(&out, &want, 0.01);
    }

    #[test]
    fn test_exp_taylor_wide_range_follows_limit_formula() {
        // (1 + x/2^n)^(2^n) drifts from e^x as |x| grows; the drift itself
        // is the documented behaviour.
        let ctx = ctx();
        let x = secret(&ctx, &[8.0, -8.0]);
        let out = open(&ctx, &f_exp(&ctx, &x).unwrap());
        let n = 256.0f64;
        let want = [(1.0 + 8.0 / n).powf(n), (1.0 - 8.0 / n).powf(n)];
        assert_rel(&out, &want, 0.01);
    }

    #[test]
    fn test_exp_pade_mode() {
        let config = RuntimeConfig {
            fxp_exp_mode: ExpMode::Pade,
            ..Default::default()
        };
        let ctx = ctx_with(config);
        let inputs = [-8.0, -3.0, -1.0, 0.0, 1.0, 3.0, 8.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_exp(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.exp()).collect();
        assert_rel(&out, &want, 0.01);
    }

    #[test]
    fn test_exp2_positive_and_negative() {
        let ctx = ctx();
        let inputs = [0.0, 0.5, 1.5, 4.25, -0.5, -3.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_exp2(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.exp2()).collect();
        assert_rel(&out, &want, 0.01);
    }

    #[test]
    fn test_tanh_pade_within_clamp() {
        let ctx = ctx();
        let inputs = [-3.0, -1.0, -0.25, 0.0, 0.5, 1.0, 3.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_tanh(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.tanh()).collect();
        assert_abs(&out, &want, 1e-3);
    }

    #[test]
    fn test_rsqrt_accuracy() {
        let ctx = ctx();
        let inputs = [0.25, 0.3, 1.0, 2.0, 16.0, 1000.0, 0.001];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_rsqrt(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| 1.0 / v.sqrt()).collect();
        assert_rel(&out, &want, 0.003);
    }

    #[test]
    fn test_rsqrt_lower_accuracy_mode() {
        let config = RuntimeConfig {
            enable_lower_accuracy_rsqrt: true,
            ..Default::default()
        };
        let ctx = ctx_with(config);
        let inputs = [0.5, 4.0, 100.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_rsqrt(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| 1.0 / v.sqrt()).collect();
        assert_rel(&out, &want, 0.02);
    }

    #[test]
    fn test_rsqrt_intra_op_parallel_matches_sequential() {
        let seq_ctx = ctx();
        let par_ctx = ctx_with(RuntimeConfig {
            experimental_enable_intra_op_par: true,
            ..Default::default()
        });
        let inputs = [0.25, 2.0, 9.0];
        let seq = open(&seq_ctx, &f_rsqrt(&seq_ctx, &secret(&seq_ctx, &inputs)).unwrap());
        let par = open(&par_ctx, &f_rsqrt(&par_ctx, &secret(&par_ctx, &inputs)).unwrap());
        // Same algorithm either way; only share randomness differs.
        assert_abs(&seq, &par, 1e-4);
    }

    #[test]
    fn test_sqrt() {
        let ctx = ctx();
        let inputs = [0.25, 1.0, 2.0, 100.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_sqrt(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| v.sqrt()).collect();
        assert_rel(&out, &want, 0.003);
    }

    #[test]
    fn test_sigmoid_mm1_is_linear() {
        let ctx = ctx();
        let x = secret(&ctx, &[2.0, 0.0, -2.0]);
        let out = open(&ctx, &f_sigmoid(&ctx, &x).unwrap());
        assert_abs(&out, &[0.75, 0.5, 0.25], 1e-4);
    }

    #[test]
    fn test_sigmoid_seg3_saturates() {
        let config = RuntimeConfig {
            sigmoid_mode: SigmoidMode::Seg3,
            ..Default::default()
        };
        let ctx = ctx_with(config);
        let x = secret(&ctx, &[-5.0, 0.0, 5.0, 2.0]);
        let out = open(&ctx, &f_sigmoid(&ctx, &x).unwrap());
        assert_abs(&out, &[0.0, 0.5, 1.0, 0.75], 1e-4);
    }

    #[test]
    fn test_sigmoid_real_accuracy() {
        let config = RuntimeConfig {
            sigmoid_mode: SigmoidMode::Real,
            ..Default::default()
        };
        let ctx = ctx_with(config);
        let inputs = [-8.0, -4.0, -1.0, 0.0, 1.0, 4.0, 8.0];
        let x = secret(&ctx, &inputs);
        let out = open(&ctx, &f_sigmoid(&ctx, &x).unwrap());
        let want: Vec<f64> = inputs.iter().map(|v| 1.0 / (1.0 + (-v).exp())).collect();
        assert_abs(&out, &want, 1e-3);
    }

    #[test]
    fn test_non_fxp_rejected() {
        let ctx = ctx();
        let x = crate::constants::constant_int(&ctx, 3, crate::value::DataType::I32, &[1]);
        assert!(matches!(
            f_exp(&ctx, &x),
            Err(HalError::UnsupportedDtype { .. })
        ));
    }
}
