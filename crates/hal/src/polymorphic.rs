//! Polymorphic frontend
//!
//! Entry points dispatch on the operand dtypes: integer pairs are promoted
//! to the wider integer kernel, anything touching fixed-point runs the
//! fixed-point kernel after promotion. The exception is multiplication
//! with one integer operand, where the integer side stays unscaled and the
//! raw ring product needs no extra truncation.

use tracing::trace;

use crate::constants::{constant_fxp, ring_constant};
use crate::context::Context;
use crate::error::{HalError, Result};
use crate::fxp;
use crate::fxp_approx;
use crate::integer;
use crate::ring::{
    ring_and, ring_arshift, ring_lshift, ring_mmul, ring_mul, ring_mux, ring_not, ring_or,
    ring_rshift, ring_sign, ring_sub, ring_xor,
};
use crate::type_cast::dtype_cast;
use crate::value::{DataType, Storage, Value};

type BinaryFn = fn(&Context, &Value, &Value) -> Result<Value>;
type UnaryFn = fn(&Context, &Value) -> Result<Value>;

fn binary_dispatch(
    ctx: &Context,
    x: &Value,
    y: &Value,
    fxp_fn: BinaryFn,
    int_fn: BinaryFn,
) -> Result<Value> {
    if x.is_int() && y.is_int() {
        let common = x.dtype().promote_int(y.dtype());
        int_fn(
            ctx,
            &dtype_cast(ctx, x, common)?,
            &dtype_cast(ctx, y, common)?,
        )
    } else if x.is_int() {
        fxp_fn(ctx, &dtype_cast(ctx, x, DataType::Fxp)?, y)
    } else if y.is_int() {
        fxp_fn(ctx, x, &dtype_cast(ctx, y, DataType::Fxp)?)
    } else {
        fxp_fn(ctx, x, y)
    }
}

fn unary_dispatch(ctx: &Context, x: &Value, fxp_fn: UnaryFn, int_fn: UnaryFn) -> Result<Value> {
    if x.is_int() {
        int_fn(ctx, x)
    } else {
        fxp_fn(ctx, x)
    }
}

fn is_cross_int_fxp(x: &Value, y: &Value) -> bool {
    (x.is_fxp() && y.is_int()) || (x.is_int() && y.is_fxp())
}

pub fn add(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    trace!(lhs = ?x.shape(), rhs = ?y.shape(), "add");
    binary_dispatch(ctx, x, y, fxp::f_add, integer::i_add)
}

pub fn sub(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    binary_dispatch(ctx, x, y, fxp::f_sub, integer::i_sub)
}

pub fn mul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    trace!(lhs = ?x.shape(), rhs = ?y.shape(), "mul");
    // The unscaled integer side multiplies straight into the fixed-point
    // encoding, saving a truncation round.
    if is_cross_int_fxp(x, y) {
        return Ok(ring_mul(ctx, x, y)?.as_fxp());
    }
    binary_dispatch(ctx, x, y, fxp::f_mul, integer::i_mul)
}

pub fn matmul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if is_cross_int_fxp(x, y) {
        return Ok(ring_mmul(ctx, x, y)?.as_fxp());
    }
    binary_dispatch(ctx, x, y, fxp::f_mmul, integer::i_mmul)
}

pub fn negate(ctx: &Context, x: &Value) -> Result<Value> {
    unary_dispatch(ctx, x, fxp::f_negate, integer::i_negate)
}

pub fn abs(ctx: &Context, x: &Value) -> Result<Value> {
    unary_dispatch(ctx, x, fxp::f_abs, integer::i_abs)
}

pub fn equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    binary_dispatch(ctx, x, y, fxp::f_equal, integer::i_equal)
}

pub fn not_equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    logical_not(ctx, &equal(ctx, x, y)?)
}

pub fn less(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    binary_dispatch(ctx, x, y, fxp::f_less, integer::i_less)
}

pub fn greater(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    less(ctx, y, x)
}

pub fn less_equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    logical_not(ctx, &greater(ctx, x, y)?)
}

pub fn greater_equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    logical_not(ctx, &less(ctx, x, y)?)
}

/// 1 - x for 0/1 values (XOR for boolean-shared storage).
pub fn logical_not(ctx: &Context, x: &Value) -> Result<Value> {
    let k1 = ring_constant(ctx, 1, x.shape());
    match x.storage() {
        Storage::SecretBool(_) => Ok(ring_xor(ctx, x, &k1)?.with_dtype(x.dtype())),
        _ => Ok(ring_sub(ctx, &k1, x)?.with_dtype(x.dtype())),
    }
}

/// pred ? a : b; predicate must be an integer 0/1 value.
pub fn select(ctx: &Context, pred: &Value, a: &Value, b: &Value) -> Result<Value> {
    if !pred.is_int() {
        return Err(HalError::UnsupportedDtype {
            op: "select",
            dtype: pred.dtype(),
        });
    }
    if a.dtype() != b.dtype() {
        return Err(HalError::DtypeMismatch {
            op: "select",
            lhs: a.dtype(),
            rhs: b.dtype(),
        });
    }
    Ok(ring_mux(ctx, pred, a, b)?.with_dtype(a.dtype()))
}

pub fn max(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if x.dtype() != y.dtype() {
        return Err(HalError::DtypeMismatch {
            op: "max",
            lhs: x.dtype(),
            rhs: y.dtype(),
        });
    }
    select(ctx, &greater(ctx, x, y)?, x, y)
}

pub fn min(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if x.dtype() != y.dtype() {
        return Err(HalError::DtypeMismatch {
            op: "min",
            lhs: x.dtype(),
            rhs: y.dtype(),
        });
    }
    select(ctx, &less(ctx, x, y)?, x, y)
}

pub fn clamp(ctx: &Context, x: &Value, minv: &Value, maxv: &Value) -> Result<Value> {
    if minv.dtype() != maxv.dtype() || minv.dtype() != x.dtype() {
        return Err(HalError::DtypeMismatch {
            op: "clamp",
            lhs: minv.dtype(),
            rhs: maxv.dtype(),
        });
    }
    min(ctx, &max(ctx, minv, x)?, maxv)
}

pub fn exp(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_exp(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

pub fn exp2(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_exp2(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

pub fn log(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_log(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

pub fn log2(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_log2(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

pub fn log1p(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_log1p(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

/// tanh saturates to +-1 outside [-3, 3], where the Pade ratio holds.
pub fn tanh(ctx: &Context, x: &Value) -> Result<Value> {
    let x = dtype_cast(ctx, x, DataType::Fxp)?;
    let clamped = fxp::f_clamp(
        ctx,
        &x,
        &constant_fxp(ctx, -3.0, x.shape()),
        &constant_fxp(ctx, 3.0, x.shape()),
    )?;
    fxp_approx::f_tanh(ctx, &clamped)
}

pub fn rsqrt(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_rsqrt(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

pub fn sqrt(ctx: &Context, x: &Value) -> Result<Value> {
    fxp_approx::f_sqrt(ctx, &dtype_cast(ctx, x, DataType::Fxp)?)
}

/// Sigmoid; fixed-point inputs only.
pub fn logistic(ctx: &Context, x: &Value) -> Result<Value> {
    if !x.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op: "logistic",
            dtype: x.dtype(),
        });
    }
    fxp_approx::f_sigmoid(ctx, x)
}

pub fn reciprocal(ctx: &Context, x: &Value) -> Result<Value> {
    if !x.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op: "reciprocal",
            dtype: x.dtype(),
        });
    }
    fxp::f_reciprocal(ctx, x)
}

pub fn floor(ctx: &Context, x: &Value) -> Result<Value> {
    if !x.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op: "floor",
            dtype: x.dtype(),
        });
    }
    fxp::f_floor(ctx, x)
}

pub fn ceil(ctx: &Context, x: &Value) -> Result<Value> {
    if !x.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op: "ceil",
            dtype: x.dtype(),
        });
    }
    fxp::f_ceil(ctx, x)
}

/// x^y = e^(y ln x)
pub fn power(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    exp(ctx, &mul(ctx, y, &log(ctx, x)?)?)
}

/// Signed integer division, exact up to the one-unit correction.
pub fn idiv(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let sign_x = sign(ctx, x)?;
    let sign_y = sign(ctx, y)?;

    let abs_x = mul(ctx, x, &sign_x)?;
    let abs_y = mul(ctx, y, &sign_y)?;

    let x_f = dtype_cast(ctx, &abs_x, DataType::Fxp)?;
    let y_f = dtype_cast(ctx, &abs_y, DataType::Fxp)?;
    let approx_q = div(ctx, &x_f, &y_f)?;

    // The fixed-point quotient carries truncation error, so nudge it onto
    // the exact lattice: ++q if (q+1)*y <= x, --q if q*y > x.
    let approx_q = dtype_cast(ctx, &approx_q, x.dtype())?;
    let approx_x = mul(ctx, &abs_y, &approx_q)?;
    let v1 = less_equal(ctx, &add(ctx, &approx_x, &abs_y)?, &abs_x)?;
    let v2 = greater(ctx, &approx_x, &abs_x)?;
    let q = sub(ctx, &add(ctx, &approx_q, &v1)?, &v2)?;

    mul(ctx, &q, &mul(ctx, &sign_x, &sign_y)?)
}

pub fn div(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if x.is_int() && y.is_int() {
        return idiv(ctx, x, y);
    }
    let x_f = dtype_cast(ctx, x, DataType::Fxp)?;
    let y_f = dtype_cast(ctx, y, DataType::Fxp)?;
    fxp::f_div(ctx, &x_f, &y_f)
}

/// Sign as +-1 (zero maps to +1).
pub fn sign(ctx: &Context, x: &Value) -> Result<Value> {
    Ok(ring_sign(ctx, x)?.with_dtype(DataType::I8))
}

pub fn bitwise_and(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if !x.is_int() || !y.is_int() {
        return Err(HalError::DtypeMismatch {
            op: "bitwise_and",
            lhs: x.dtype(),
            rhs: y.dtype(),
        });
    }
    Ok(ring_and(ctx, x, y)?.with_dtype(x.dtype()))
}

pub fn bitwise_or(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if !x.is_int() || !y.is_int() {
        return Err(HalError::DtypeMismatch {
            op: "bitwise_or",
            lhs: x.dtype(),
            rhs: y.dtype(),
        });
    }
    Ok(ring_or(ctx, x, y)?.with_dtype(x.dtype()))
}

pub fn bitwise_xor(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    if !x.is_int() || !y.is_int() {
        return Err(HalError::DtypeMismatch {
            op: "bitwise_xor",
            lhs: x.dtype(),
            rhs: y.dtype(),
        });
    }
    Ok(ring_xor(ctx, x, y)?.with_dtype(x.dtype()))
}

pub fn bitwise_not(ctx: &Context, x: &Value) -> Result<Value> {
    if !x.is_int() {
        return Err(HalError::UnsupportedDtype {
            op: "bitwise_not",
            dtype: x.dtype(),
        });
    }
    Ok(ring_not(ctx, x)?.with_dtype(x.dtype()))
}

pub fn left_shift(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    Ok(ring_lshift(ctx, x, bits)?.with_dtype(x.dtype()))
}

pub fn right_shift_logical(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    Ok(ring_rshift(ctx, x, bits)?.with_dtype(x.dtype()))
}

pub fn right_shift_arithmetic(ctx: &Context, x: &Value, bits: usize) -> Result<Value> {
    Ok(ring_arshift(ctx, x, bits)?.with_dtype(x.dtype()))
}
