//! Share engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Ring error: {0}")]
    Ring(#[from] mantle_ring::RingError),

    #[error("Share has {got} parts, engine runs {expected} parties")]
    PartyCountMismatch { expected: usize, got: usize },

    #[error("Engine failure: {0}")]
    Failure(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
