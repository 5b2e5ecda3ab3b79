//! Mantle HAL
//!
//! The high-level arithmetic layer of the Mantle MPC runtime: typed tensor
//! values over secret shares, fixed-point kernels with their transcendental
//! approximations, and the polymorphic dispatch the tensor-program executor
//! calls into.
//!
//! Layering, bottom up: `mantle_ring` supplies plaintext mod-2^k tensor
//! algebra, `mantle_engine` supplies the secret-share primitives, the
//! modules here compose them into dtype-aware kernels parameterised by an
//! evaluation [`Context`].

mod config;
mod constants;
mod context;
mod error;
mod fxp;
mod fxp_approx;
mod integer;
mod polymorphic;
mod ring;
mod type_cast;
mod value;

pub use config::{ExpMode, LogMode, Protocol, RuntimeConfig, SigmoidMode};
pub use constants::{
    constant_fxp, constant_fxp_slice, constant_int, constant_int_slice, decode_fxp, decode_int,
};
pub use context::Context;
pub use error::{HalError, Result};
pub use polymorphic::{
    abs, add, bitwise_and, bitwise_not, bitwise_or, bitwise_xor, ceil, clamp, div, equal, exp,
    exp2, floor, greater, greater_equal, idiv, left_shift, less, less_equal, log, log1p, log2,
    logical_not, logistic, matmul, max, min, mul, negate, not_equal, power, reciprocal,
    right_shift_arithmetic, right_shift_logical, rsqrt, select, sign, sqrt, sub, tanh,
};
pub use type_cast::{bitcast, dtype_cast, reveal, seal};
pub use value::{DataType, Storage, Value, Visibility};

pub use mantle_engine::{DealerEngine, ShareEngine};
pub use mantle_ring::Field;
