//! Ring tensor error types

use thiserror::Error;

use crate::field::Field;

#[derive(Error, Debug)]
pub enum RingError {
    #[error("Shape mismatch: {lhs:?} and {rhs:?} do not broadcast")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("Field mismatch: {lhs:?} vs {rhs:?}")]
    FieldMismatch { lhs: Field, rhs: Field },

    #[error("Shift by {bits} bits is out of range for {field:?}")]
    ShiftOutOfRange { field: Field, bits: usize },

    #[error("Bit range {start}..{end} is invalid for {field:?}")]
    BitRangeInvalid { field: Field, start: usize, end: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Matmul requires 2-D operands, got rank {lhs} and rank {rhs}")]
    NotMatrices { lhs: usize, rhs: usize },
}

pub type Result<T> = std::result::Result<T, RingError>;
