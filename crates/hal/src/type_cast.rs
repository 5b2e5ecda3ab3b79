//! Dtype and visibility casts

use mantle_engine::ShareEngine;

use crate::context::Context;
use crate::error::Result;
use crate::ring::{prefer_a, ring_arshift, ring_lshift};
use crate::value::{DataType, Storage, Value};

/// Cast between integer and fixed-point interpretations.
///
/// Integers gain the 2^f scale by a left shift; fixed-points drop the
/// fraction by an arithmetic right shift, rounding toward negative
/// infinity. Integer-to-integer casts only retag (values already live in
/// the full ring).
pub fn dtype_cast(ctx: &Context, x: &Value, to: DataType) -> Result<Value> {
    if x.dtype() == to {
        return Ok(x.clone());
    }
    let f = ctx.fxp_bits();
    match (x.is_int(), to.is_int()) {
        // int -> fxp
        (true, false) => Ok(ring_lshift(ctx, x, f)?.with_dtype(DataType::Fxp)),
        // fxp -> int
        (false, true) => Ok(prefer_a(ctx, &ring_arshift(ctx, x, f)?)?.with_dtype(to)),
        // int -> wider/narrower int
        (true, true) => Ok(x.clone().with_dtype(to)),
        (false, false) => unreachable!("equal dtypes handled above"),
    }
}

/// Secret-share a public value (p2s).
pub fn seal(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::Public(t) => Ok(Value::secret_arith(ctx.engine().share(t)?, x.dtype())),
        _ => Ok(x.clone()),
    }
}

/// Open a secret value to all parties (s2p).
pub fn reveal(ctx: &Context, x: &Value) -> Result<Value> {
    match x.storage() {
        Storage::Public(_) => Ok(x.clone()),
        Storage::SecretArith(s) => Ok(Value::public(
            ctx.engine().reveal_a(s)?,
            x.dtype(),
        )),
        Storage::SecretBool(s) => Ok(Value::public(
            ctx.engine().reveal_b(s)?,
            x.dtype(),
        )),
    }
}

/// Reinterpret storage under a new dtype without touching bits.
pub fn bitcast(_ctx: &Context, x: &Value, dtype: DataType) -> Result<Value> {
    Ok(x.clone().with_dtype(dtype))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::constants::{constant_fxp_slice, constant_int_slice, decode_fxp, decode_int};
    use mantle_engine::DealerEngine;
    use mantle_ring::Field;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::new(
            RuntimeConfig::default(),
            Arc::new(DealerEngine::new(Field::Fm64, 5)),
        )
        .unwrap()
    }

    #[test]
    fn test_int_to_fxp_and_back() {
        let ctx = ctx();
        let v = constant_int_slice(&ctx, &[3, -4], DataType::I32, &[2]).unwrap();
        let f = dtype_cast(&ctx, &v, DataType::Fxp).unwrap();
        assert_eq!(decode_fxp(&ctx, &f).unwrap(), vec![3.0, -4.0]);
        let back = dtype_cast(&ctx, &f, DataType::I32).unwrap();
        assert_eq!(decode_int(&ctx, &back).unwrap(), vec![3, -4]);
    }

    #[test]
    fn test_fxp_to_int_floors() {
        let ctx = ctx();
        let v = constant_fxp_slice(&ctx, &[2.75, -2.75], &[2]).unwrap();
        let i = dtype_cast(&ctx, &v, DataType::I64).unwrap();
        assert_eq!(decode_int(&ctx, &i).unwrap(), vec![2, -3]);
    }

    #[test]
    fn test_seal_reveal_roundtrip() {
        let ctx = ctx();
        let v = constant_fxp_slice(&ctx, &[1.25, -0.5], &[2]).unwrap();
        let sealed = seal(&ctx, &v).unwrap();
        assert!(sealed.is_secret());
        let opened = reveal(&ctx, &sealed).unwrap();
        assert_eq!(decode_fxp(&ctx, &opened).unwrap(), vec![1.25, -0.5]);
    }

    #[test]
    fn test_secret_cast_roundtrip() {
        let ctx = ctx();
        let v = constant_int_slice(&ctx, &[7, -9], DataType::I64, &[2]).unwrap();
        let sealed = seal(&ctx, &v).unwrap();
        let f = dtype_cast(&ctx, &sealed, DataType::Fxp).unwrap();
        let back = dtype_cast(&ctx, &f, DataType::I64).unwrap();
        let opened = reveal(&ctx, &back).unwrap();
        assert_eq!(decode_int(&ctx, &opened).unwrap(), vec![7, -9]);
    }
}
