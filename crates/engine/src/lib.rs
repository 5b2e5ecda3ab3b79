//! Mantle Share Engine
//!
//! The capability contract between the arithmetic layer and the underlying
//! MPC protocol, plus an in-process reference engine.
//!
//! The arithmetic layer never touches protocol internals: it hands share
//! containers to a [`ShareEngine`] and composes the primitives this trait
//! exposes. Production engines (2-party semi-honest, honest-majority
//! 3-party, HE-assisted) live outside this workspace and plug in through
//! the same trait; the in-tree [`DealerEngine`] executes the 2-party
//! additive/XOR share algebra with a local trusted dealer so the whole
//! stack can be exercised without a network.

mod dealer;
mod engine;
mod error;
mod shares;

pub use dealer::DealerEngine;
pub use engine::ShareEngine;
pub use error::{EngineError, Result};
pub use shares::{ArithShares, BoolShares};
