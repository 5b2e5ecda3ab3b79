//! Mantle Ring Tensors
//!
//! Element-wise arithmetic on mod-2^k ring tensors, the bit utilities the
//! secure numeric kernels are built from, and the fixed-point encoding of
//! reals into ring elements.
//!
//! Everything here operates on public data. Secret-shared variants of these
//! operations are provided by the share engine, which applies the same ring
//! algebra to the individual shares.

mod encode;
mod error;
mod field;
mod tensor;

pub use encode::{decode_f64, encode_f64, encode_i64};
pub use error::{Result, RingError};
pub use field::Field;
pub use tensor::{broadcast_shapes, RingTensor};
