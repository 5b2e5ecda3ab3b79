//! Runtime configuration
//!
//! Immutable after construction; carried by the evaluation context and
//! shared read-only across forks.

use mantle_ring::Field;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, Result};

/// Which share engine backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Protocol {
    /// Semi-honest 2-party over Z_{2^k}
    #[default]
    Semi2k,
    /// Honest-majority 3-party
    Aby3,
    /// HE-assisted 2-party
    Cheetah,
}

/// Exponentiation approximation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpMode {
    /// Resolves to [`ExpMode::Taylor`].
    #[default]
    Default,
    /// e^x as lim (1 + x/2^n)^(2^n); cheap, accurate near zero.
    Taylor,
    /// Clamp then evaluate through the exp2 Pade path.
    Pade,
}

/// Logarithm approximation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogMode {
    /// Resolves to [`LogMode::Pade`].
    #[default]
    Default,
    /// ln(2) * log2(x) with the normalised Pade ratio.
    Pade,
    /// Modified Householder iterations.
    Newton,
}

/// Sigmoid approximation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigmoidMode {
    /// Resolves to [`SigmoidMode::Mm1`].
    #[default]
    Default,
    /// 0.5 + 0.125 * x
    Mm1,
    /// Piecewise linear, saturating outside [-4, 4].
    Seg3,
    /// 1 / (1 + exp(-x))
    Real,
}

/// Session-wide runtime options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ring width.
    pub field: Field,
    /// Share engine selector.
    pub protocol: Protocol,
    /// Fixed-point fractional bits; 0 picks the field default.
    pub fxp_fraction_bits: usize,
    pub fxp_exp_mode: ExpMode,
    /// Iterations (and pre-truncation bits) of the Taylor-limit exp.
    pub fxp_exp_iters: usize,
    pub fxp_log_mode: LogMode,
    /// Householder iterations for LOG_NEWTON.
    pub fxp_log_iters: usize,
    /// Householder series order for LOG_NEWTON.
    pub fxp_log_orders: usize,
    /// Goldschmidt division iterations.
    pub fxp_div_goldschmidt_iters: usize,
    pub sigmoid_mode: SigmoidMode,
    /// Use the cheaper quadratic rsqrt seed polynomial.
    pub enable_lower_accuracy_rsqrt: bool,
    /// Run designated kernel branches on a forked context in parallel.
    pub experimental_enable_intra_op_par: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            field: Field::Fm64,
            protocol: Protocol::Semi2k,
            fxp_fraction_bits: 0,
            fxp_exp_mode: ExpMode::Default,
            fxp_exp_iters: 8,
            fxp_log_mode: LogMode::Default,
            fxp_log_iters: 3,
            fxp_log_orders: 8,
            fxp_div_goldschmidt_iters: 2,
            sigmoid_mode: SigmoidMode::Default,
            enable_lower_accuracy_rsqrt: false,
            experimental_enable_intra_op_par: false,
        }
    }
}

impl RuntimeConfig {
    /// The working fractional-bit count, resolving the field default.
    pub fn fraction_bits(&self) -> usize {
        if self.fxp_fraction_bits == 0 {
            self.field.default_fraction_bits()
        } else {
            self.fxp_fraction_bits
        }
    }

    /// Reject configurations the kernels cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fraction_bits() == 0 || 2 * self.fraction_bits() > self.field.bits() {
            return Err(HalError::InvalidConfig(format!(
                "fxp_fraction_bits {} out of range for {:?}",
                self.fraction_bits(),
                self.field
            )));
        }
        if self.fxp_exp_iters == 0 {
            return Err(HalError::InvalidConfig("fxp_exp_iters must not be 0".into()));
        }
        if self.fxp_log_iters == 0 {
            return Err(HalError::InvalidConfig("fxp_log_iters must not be 0".into()));
        }
        if self.fxp_log_orders == 0 {
            return Err(HalError::InvalidConfig("fxp_log_orders must not be 0".into()));
        }
        if self.fxp_div_goldschmidt_iters == 0 {
            return Err(HalError::InvalidConfig(
                "fxp_div_goldschmidt_iters must not be 0".into(),
            ));
        }
        Ok(())
    }
}
