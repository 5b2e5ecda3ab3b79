//! Visibility dispatch over ring primitives
//!
//! Every function here routes by share domain: public operands use the
//! plaintext ring ops, secret operands go to the share engine, and
//! boolean-shared operands of arithmetic operations are converted first.
//! Results keep the left operand's dtype; kernels retag as needed.

use mantle_engine::ShareEngine;

use crate::constants::ring_constant;
use crate::context::Context;
use crate::error::Result;
use crate::value::{Storage, Value};

/// Convert to the arithmetic share domain if boolean-shared.
pub(crate) fn prefer_a(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::SecretBool(b) => Ok(Value::secret_arith(ctx.engine().b2a(b)?, x.dtype())),
        _ => Ok(x.clone()),
    }
}

/// Convert to the boolean share domain if arithmetic-shared.
pub(crate) fn prefer_b(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::SecretArith(a) => Ok(Value::secret_bool(ctx.engine().a2b(a)?, x.dtype())),
        _ => Ok(x.clone()),
    }
}

pub(crate) fn ring_add(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let x = prefer_a(ctx, x)?;
    let y = prefer_a(ctx, y)?;
    let dtype = x.dtype();
    match (x.storage(), y.storage()) {
        (Storage::Public(a), Storage::Public(b)) => Ok(Value::public(a.add(b)?, dtype)),
        (Storage::SecretArith(a), Storage::Public(b)) => {
            Ok(Value::secret_arith(ctx.engine().add_ap(a, b)?, dtype))
        }
        (Storage::Public(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().add_ap(b, a)?, dtype))
        }
        (Storage::SecretArith(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().add_aa(a, b)?, dtype))
        }
        _ => unreachable!("boolean operands converted above"),
    }
}

pub(crate) fn ring_negate(ctx: &Context, x: &Value) -> Result<Value> {
    let x = prefer_a(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.negate(), x.dtype())),
        Storage::SecretArith(a) => {
            Ok(Value::secret_arith(ctx.engine().negate_a(a)?, x.dtype()))
        }
        Storage::SecretBool(_) => unreachable!("boolean operand converted above"),
    }
}

pub(crate) fn ring_sub(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    ring_add(ctx, x, &ring_negate(ctx, y)?)
}

pub(crate) fn ring_mul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let x = prefer_a(ctx, x)?;
    let y = prefer_a(ctx, y)?;
    let dtype = x.dtype();
    match (x.storage(), y.storage()) {
        (Storage::Public(a), Storage::Public(b)) => Ok(Value::public(a.mul(b)?, dtype)),
        (Storage::SecretArith(a), Storage::Public(b)) => {
            Ok(Value::secret_arith(ctx.engine().mul_ap(a, b)?, dtype))
        }
        (Storage::Public(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().mul_ap(b, a)?, dtype))
        }
        (Storage::SecretArith(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().mul_aa(a, b)?, dtype))
        }
        _ => unreachable!("boolean operands converted above"),
    }
}

pub(crate) fn ring_mmul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let x = prefer_a(ctx, x)?;
    let y = prefer_a(ctx, y)?;
    let dtype = x.dtype();
    match (x.storage(), y.storage()) {
        (Storage::Public(a), Storage::Public(b)) => Ok(Value::public(a.matmul(b)?, dtype)),
        (Storage::SecretArith(a), Storage::Public(b)) => {
            Ok(Value::secret_arith(ctx.engine().mmul_ap(a, b)?, dtype))
        }
        (Storage::Public(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().mmul_pa(a, b)?, dtype))
        }
        (Storage::SecretArith(a), Storage::SecretArith(b)) => {
            Ok(Value::secret_arith(ctx.engine().mmul_aa(a, b)?, dtype))
        }
        _ => unreachable!("boolean operands converted above"),
    }
}

/// Protocol-safe division by 2^bits.
pub(crate) fn ring_trunc(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    let x = prefer_a(ctx, x)?;
    match x.storage() {
        // Public truncation is an exact floored division.
        Storage::Public(t) => Ok(Value::public(t.arshift(bits)?, x.dtype())),
        Storage::SecretArith(a) => {
            Ok(Value::secret_arith(ctx.engine().trunc_a(a, bits)?, x.dtype()))
        }
        Storage::SecretBool(_) => unreachable!("boolean operand converted above"),
    }
}

pub(crate) fn ring_lshift(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.lshift(bits)?, x.dtype())),
        Storage::SecretArith(a) => {
            Ok(Value::secret_arith(ctx.engine().lshift_a(a, bits)?, x.dtype()))
        }
        Storage::SecretBool(b) => {
            Ok(Value::secret_bool(ctx.engine().lshift_b(b, bits)?, x.dtype()))
        }
    }
}

pub(crate) fn ring_rshift(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.rshift(bits)?, x.dtype())),
        Storage::SecretBool(b) => {
            Ok(Value::secret_bool(ctx.engine().rshift_b(b, bits)?, x.dtype()))
        }
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_arshift(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.arshift(bits)?, x.dtype())),
        Storage::SecretBool(b) => {
            Ok(Value::secret_bool(ctx.engine().arshift_b(b, bits)?, x.dtype()))
        }
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_xor(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    let y = prefer_b(ctx, y)?;
    let dtype = x.dtype();
    match (x.storage(), y.storage()) {
        (Storage::Public(a), Storage::Public(b)) => Ok(Value::public(a.xor(b)?, dtype)),
        (Storage::SecretBool(a), Storage::Public(b)) => {
            Ok(Value::secret_bool(ctx.engine().xor_bp(a, b)?, dtype))
        }
        (Storage::Public(a), Storage::SecretBool(b)) => {
            Ok(Value::secret_bool(ctx.engine().xor_bp(b, a)?, dtype))
        }
        (Storage::SecretBool(a), Storage::SecretBool(b)) => {
            Ok(Value::secret_bool(ctx.engine().xor_bb(a, b)?, dtype))
        }
        _ => unreachable!("arithmetic operands converted above"),
    }
}

pub(crate) fn ring_and(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    let y = prefer_b(ctx, y)?;
    let dtype = x.dtype();
    match (x.storage(), y.storage()) {
        (Storage::Public(a), Storage::Public(b)) => Ok(Value::public(a.and(b)?, dtype)),
        (Storage::SecretBool(a), Storage::Public(b)) => {
            Ok(Value::secret_bool(ctx.engine().and_bp(a, b)?, dtype))
        }
        (Storage::Public(a), Storage::SecretBool(b)) => {
            Ok(Value::secret_bool(ctx.engine().and_bp(b, a)?, dtype))
        }
        (Storage::SecretBool(a), Storage::SecretBool(b)) => {
            Ok(Value::secret_bool(ctx.engine().and_bb(a, b)?, dtype))
        }
        _ => unreachable!("arithmetic operands converted above"),
    }
}

pub(crate) fn ring_or(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if let (Storage::Public(a), Storage::Public(b)) = (x.storage(), y.storage()) {
        return Ok(Value::public(a.or(b)?, x.dtype()));
    }
    // a | b = a ^ b ^ (a & b)
    let xored = ring_xor(ctx, x, y)?;
    ring_xor(ctx, &xored, &ring_and(ctx, x, y)?)
}

pub(crate) fn ring_not(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.not(), x.dtype())),
        _ => {
            let ones = ring_constant(ctx, ctx.field().mask(), x.shape());
            ring_xor(ctx, x, &ones)
        }
    }
}

pub(crate) fn ring_bitrev(ctx: &Context, x: &Value, start: usize, end: usize) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.bitrev(start, end)?, x.dtype())),
        Storage::SecretBool(b) => Ok(Value::secret_bool(
            ctx.engine().bitrev_b(b, start, end)?,
            x.dtype(),
        )),
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_bit_parity(ctx: &Context, x: &Value, nbits: usize) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.bit_parity(nbits)?, x.dtype())),
        Storage::SecretBool(b) => Ok(Value::secret_bool(
            ctx.engine().bit_parity_b(b, nbits)?,
            x.dtype(),
        )),
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_popcount(ctx: &Context, x: &Value, nbits: usize) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.popcount(nbits)?, x.dtype())),
        Storage::SecretBool(b) => Ok(Value::secret_arith(
            ctx.engine().popcount_b(b, nbits)?,
            x.dtype(),
        )),
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_prefix_or(ctx: &Context, x: &Value) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.prefix_or(), x.dtype())),
        Storage::SecretBool(b) => {
            Ok(Value::secret_bool(ctx.engine().prefix_or_b(b)?, x.dtype()))
        }
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

pub(crate) fn ring_bitdeintl(ctx: &Context, x: &Value) -> Result<Value> {
    let x = prefer_b(ctx, x)?;
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(t.bitdeintl(), x.dtype())),
        Storage::SecretBool(b) => {
            Ok(Value::secret_bool(ctx.engine().bitdeintl_b(b)?, x.dtype()))
        }
        Storage::SecretArith(_) => unreachable!("arithmetic operand converted above"),
    }
}

/// The sign bit as a 0/1 value.
pub(crate) fn ring_msb(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::Public(t) => Ok(Value::public(
            t.rshift(ctx.field().bits() - 1)?,
            x.dtype(),
        )),
        _ => {
            let a = prefer_a(ctx, x)?;
            match a.storage() {
                Storage::SecretArith(s) => Ok(Value::secret_bool(
                    ctx.engine().msb_a(s)?,
                    x.dtype(),
                )),
                _ => unreachable!("secret operand is arithmetic here"),
            }
        }
    }
}

/// Sign as +-1, unscaled.
pub(crate) fn ring_sign(ctx: &Context, x: &Value) -> Result<Value> {
    let msb = ring_msb(ctx, x)?;
    let doubled = ring_lshift(ctx, &msb, 1)?;
    let one = ring_constant(ctx, 1, x.shape());
    ring_sub(ctx, &one, &doubled)
}

/// Signed comparison x < y, as a 0/1 value.
pub(crate) fn ring_less(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    ring_msb(ctx, &ring_sub(ctx, x, y)?)
}

/// Bring a value into the arithmetic share domain, sharing publics.
fn as_arith(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::Public(t) => Ok(Value::secret_arith(ctx.engine().share(t)?, x.dtype())),
        _ => prefer_a(ctx, x),
    }
}

/// pred ? a : b for a 0/1 predicate.
///
/// Secret predicates go through the engine's multiplexer so protocol
/// backends can substitute a native selection circuit; a public predicate
/// stays on the arithmetic composition b + pred * (a - b).
pub(crate) fn ring_mux(ctx: &Context, pred: &Value, a: &Value, b: &Value) -> Result<Value> {
    if pred.is_secret() {
        let pred = prefer_a(ctx, pred)?;
        let a = as_arith(ctx, a)?;
        let b = as_arith(ctx, b)?;
        match (pred.storage(), a.storage(), b.storage()) {
            (
                Storage::SecretArith(p),
                Storage::SecretArith(x),
                Storage::SecretArith(y),
            ) => Ok(Value::secret_arith(
                ctx.engine().mux_a(p, x, y)?,
                b.dtype(),
            )),
            _ => unreachable!("all operands are arithmetic shares here"),
        }
    } else {
        let diff = ring_sub(ctx, a, b)?;
        ring_add(ctx, b, &ring_mul(ctx, pred, &diff)?)
    }
}
