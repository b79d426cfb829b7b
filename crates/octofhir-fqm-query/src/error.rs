//! Query generation error types

use crate::engine::EngineError;
use thiserror::Error;

/// Result type for query generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main query generation error type
#[derive(Debug, Error)]
pub enum Error {
    /// The measure defines no population criteria groups
    #[error("measure does not define any groups")]
    NoGroupDefined,

    /// The first measure group has no initial-population criteria expression
    #[error("measure does not define an IPP expression")]
    NoIppExpression,

    /// The external calculation engine failed; propagated unmodified
    #[error(transparent)]
    Engine(#[from] EngineError),
}
