//! Mantle Harness
//!
//! Session plumbing for exercising the arithmetic layer end to end against
//! the in-tree dealer engine, shared by the integration tests and the demo
//! binary.

use std::sync::Arc;

use mantle_hal::{
    constant_fxp_slice, constant_int_slice, decode_fxp, decode_int, reveal, seal, Context,
    DataType, DealerEngine, HalError, Protocol, Result, RuntimeConfig, Value,
};

/// A bound evaluation session: validated config plus a seeded engine.
pub struct Session {
    ctx: Context,
}

impl Session {
    /// Start a session. Only the SEMI2K share algebra ships in-tree (via
    /// the dealer reference engine); the other protocol backends are
    /// external and must be bound through [`Context::new`] directly.
    pub fn new(config: RuntimeConfig, seed: u64) -> Result<Self> {
        if config.protocol != Protocol::Semi2k {
            return Err(HalError::InvalidConfig(format!(
                "no in-tree engine for {:?}",
                config.protocol
            )));
        }
        let engine = Arc::new(DealerEngine::new(config.field, seed));
        Ok(Self {
            ctx: Context::new(config, engine)?,
        })
    }

    /// Default FM64 session.
    pub fn default_with_seed(seed: u64) -> Result<Self> {
        Self::new(RuntimeConfig::default(), seed)
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Encode reals and secret-share them.
    pub fn share_fxp(&self, values: &[f64]) -> Result<Value> {
        let v = constant_fxp_slice(&self.ctx, values, &[values.len()])?;
        seal(&self.ctx, &v)
    }

    /// Encode integers and secret-share them.
    pub fn share_int(&self, values: &[i64], dtype: DataType) -> Result<Value> {
        let v = constant_int_slice(&self.ctx, values, dtype, &[values.len()])?;
        seal(&self.ctx, &v)
    }

    /// Open a fixed-point value to reals.
    pub fn open_fxp(&self, value: &Value) -> Result<Vec<f64>> {
        decode_fxp(&self.ctx, &reveal(&self.ctx, value)?)
    }

    /// Open an integer value.
    pub fn open_int(&self, value: &Value) -> Result<Vec<i64>> {
        decode_int(&self.ctx, &reveal(&self.ctx, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_share_open() {
        let session = Session::default_with_seed(11).unwrap();
        let x = session.share_fxp(&[1.5, -0.75]).unwrap();
        assert!(x.is_secret());
        assert_eq!(session.open_fxp(&x).unwrap(), vec![1.5, -0.75]);
    }
}
