//! Public constants and plaintext codecs

use mantle_ring::{decode_f64, encode_f64, encode_i64, RingTensor};

use crate::context::Context;
use crate::error::{HalError, Result};
use crate::value::{DataType, Value};

/// Public fixed-point constant, one value broadcast over a shape.
pub fn constant_fxp(ctx: &Context, value: f64, shape: &[usize]) -> Value {
    let raw = encode_f64(ctx.field(), ctx.fxp_bits(), value);
    Value::public(
        RingTensor::splat(ctx.field(), shape.to_vec(), raw),
        DataType::Fxp,
    )
}

/// Public fixed-point tensor from per-element reals.
pub fn constant_fxp_slice(ctx: &Context, values: &[f64], shape: &[usize]) -> Result<Value> {
    let elems = values
        .iter()
        .map(|&v| encode_f64(ctx.field(), ctx.fxp_bits(), v))
        .collect();
    Ok(Value::public(
        RingTensor::from_raw(ctx.field(), shape.to_vec(), elems)?,
        DataType::Fxp,
    ))
}

/// Public integer constant.
pub fn constant_int(ctx: &Context, value: i64, dtype: DataType, shape: &[usize]) -> Value {
    debug_assert!(dtype.is_int());
    let raw = encode_i64(ctx.field(), value);
    Value::public(RingTensor::splat(ctx.field(), shape.to_vec(), raw), dtype)
}

/// Public integer tensor from per-element values.
pub fn constant_int_slice(
    ctx: &Context,
    values: &[i64],
    dtype: DataType,
    shape: &[usize],
) -> Result<Value> {
    debug_assert!(dtype.is_int());
    let elems = values.iter().map(|&v| encode_i64(ctx.field(), v)).collect();
    Ok(Value::public(
        RingTensor::from_raw(ctx.field(), shape.to_vec(), elems)?,
        dtype,
    ))
}

/// Unscaled raw ring constant, for bit-level kernels.
pub(crate) fn ring_constant(ctx: &Context, raw: u128, shape: &[usize]) -> Value {
    Value::public(
        RingTensor::splat(ctx.field(), shape.to_vec(), raw),
        DataType::I64,
    )
}

/// Decode a public fixed-point value to reals.
pub fn decode_fxp(ctx: &Context, value: &Value) -> Result<Vec<f64>> {
    let tensor = value.as_public().ok_or(HalError::NotPublic)?;
    if !value.is_fxp() {
        return Err(HalError::UnsupportedDtype {
            op: "decode_fxp",
            dtype: value.dtype(),
        });
    }
    Ok(tensor
        .elems()
        .iter()
        .map(|&e| decode_f64(ctx.field(), ctx.fxp_bits(), e))
        .collect())
}

/// Decode a public integer value to signed integers.
pub fn decode_int(ctx: &Context, value: &Value) -> Result<Vec<i64>> {
    let tensor = value.as_public().ok_or(HalError::NotPublic)?;
    if !value.is_int() {
        return Err(HalError::UnsupportedDtype {
            op: "decode_int",
            dtype: value.dtype(),
        });
    }
    Ok(tensor
        .elems()
        .iter()
        .map(|&e| ctx.field().to_signed(e) as i64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use mantle_engine::DealerEngine;
    use mantle_ring::Field;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::new(
            RuntimeConfig::default(),
            Arc::new(DealerEngine::new(Field::Fm64, 7)),
        )
        .unwrap()
    }

    #[test]
    fn test_fxp_constant_roundtrip() {
        let ctx = ctx();
        let v = constant_fxp_slice(&ctx, &[1.5, -2.25, 0.0], &[3]).unwrap();
        assert_eq!(decode_fxp(&ctx, &v).unwrap(), vec![1.5, -2.25, 0.0]);
    }

    #[test]
    fn test_int_constant_roundtrip() {
        let ctx = ctx();
        let v = constant_int_slice(&ctx, &[3, -4], DataType::I32, &[2]).unwrap();
        assert_eq!(decode_int(&ctx, &v).unwrap(), vec![3, -4]);
    }

    #[test]
    fn test_decode_rejects_secret() {
        let ctx = ctx();
        let v = constant_fxp(&ctx, 1.0, &[1]);
        let sealed = crate::type_cast::seal(&ctx, &v).unwrap();
        assert!(matches!(decode_fxp(&ctx, &sealed), Err(HalError::NotPublic)));
    }
}
