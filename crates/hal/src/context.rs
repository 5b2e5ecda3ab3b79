//! Evaluation context
//!
//! Carries the immutable runtime configuration and the share engine handle.
//! Kernels receive the context explicitly; the engine never reaches back
//! into it.

use std::sync::Arc;

use mantle_engine::ShareEngine;
use mantle_ring::Field;

use crate::config::RuntimeConfig;
use crate::error::{HalError, Result};

/// The evaluation context all kernels run under.
pub struct Context {
    config: RuntimeConfig,
    engine: Arc<dyn ShareEngine>,
}

impl Context {
    /// Validate the configuration and bind it to a share engine.
    pub fn new(config: RuntimeConfig, engine: Arc<dyn ShareEngine>) -> Result<Self> {
        config.validate()?;
        if engine.field() != config.field {
            return Err(HalError::InvalidConfig(format!(
                "engine runs {:?} but the configuration selects {:?}",
                engine.field(),
                config.field
            )));
        }
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn field(&self) -> Field {
        self.config.field
    }

    /// Working fixed-point fractional bits.
    pub fn fxp_bits(&self) -> usize {
        self.config.fraction_bits()
    }

    pub fn engine(&self) -> &dyn ShareEngine {
        self.engine.as_ref()
    }

    /// Number of parties behind the share engine.
    pub fn party_count(&self) -> usize {
        self.engine.party_count()
    }

    /// An independent child context for concurrent sub-operations: same
    /// configuration, forked engine randomness. All parties must fork at
    /// the same point so the children stay aligned on ordering.
    pub fn fork(&self) -> Context {
        Context {
            config: self.config.clone(),
            engine: self.engine.fork(),
        }
    }
}
