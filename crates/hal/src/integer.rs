//! Integer kernels
//!
//! Unscaled ring arithmetic; the polymorphic layer promotes both operands
//! to a common integer dtype before calling in.

use crate::constants::ring_constant;
use crate::context::Context;
use crate::error::Result;
use crate::ring::{
    ring_add, ring_less, ring_mmul, ring_mul, ring_negate, ring_sign, ring_sub,
};
use crate::value::{DataType, Value};

pub(crate) fn i_add(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_add(ctx, x, y)?.with_dtype(x.dtype()))
}

pub(crate) fn i_sub(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_sub(ctx, x, y)?.with_dtype(x.dtype()))
}

pub(crate) fn i_mul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_mul(ctx, x, y)?.with_dtype(x.dtype()))
}

pub(crate) fn i_mmul(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_mmul(ctx, x, y)?.with_dtype(x.dtype()))
}

pub(crate) fn i_negate(ctx: &Context, x: &Value) -> Result<Value> {
    Ok(ring_negate(ctx, x)?.with_dtype(x.dtype()))
}

pub(crate) fn i_abs(ctx: &Context, x: &Value) -> Result<Value> {
    let sign = ring_sign(ctx, x)?;
    Ok(ring_mul(ctx, x, &sign)?.with_dtype(x.dtype()))
}

pub(crate) fn i_less(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    Ok(ring_less(ctx, x, y)?.with_dtype(DataType::I8))
}

pub(crate) fn i_equal(ctx: &Context, x: &Value, y: &Value) -> Result<Value> {
    let one = ring_constant(ctx, 1, x.shape());
    let not_lt = ring_sub(ctx, &one, &ring_less(ctx, x, y)?)?;
    let not_gt = ring_sub(ctx, &one, &ring_less(ctx, y, x)?)?;
    Ok(ring_mul(ctx, &not_lt, &not_gt)?.with_dtype(DataType::I8))
}
