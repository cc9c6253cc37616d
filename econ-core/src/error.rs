//! Errors surfaced at the engine's public boundaries.
//!
//! Per §7, these only ever originate at economy-graph edits and at the
//! save/load entry points. Per-tick, per-actor evaluation never produces one
//! of these — a missing path or a short stockpile is not a failure, it is
//! retried next tick.

use thiserror::Error;

use crate::types::ProductId;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("adding this product would create a cycle")]
    CycleViolation,

    #[error("product {0} still has dependents")]
    DependentsExist(ProductId),

    #[error("unsupported save version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid game save: missing {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
