//! Arithmetic layer error types

use thiserror::Error;

use crate::value::DataType;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Shape mismatch: {lhs:?} and {rhs:?} do not broadcast")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("Unsupported dtypes for {op}: {lhs:?} and {rhs:?}")]
    DtypeMismatch {
        op: &'static str,
        lhs: DataType,
        rhs: DataType,
    },

    #[error("Unsupported dtype for {op}: {dtype:?}")]
    UnsupportedDtype { op: &'static str, dtype: DataType },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Value is not public")]
    NotPublic,

    #[error("Ring error: {0}")]
    Ring(#[from] mantle_ring::RingError),

    #[error("Share engine error: {0}")]
    Engine(#[from] mantle_engine::EngineError),
}

pub type Result<T> = std::result::Result<T, HalError>;
