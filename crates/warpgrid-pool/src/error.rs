//! Error types for the connection pool.

use thiserror::Error;

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur during pool operations.
///
/// Backends report failures as plain strings; the pool wraps them in the
/// variant matching the operation that failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Creating the initial `min_size` connections failed. No connection from
    /// the failed batch is left in the pool.
    #[error("pool initialization failed: {0}")]
    Initialization(String),

    /// The factory failed (or timed out) while growing the pool on demand.
    #[error("connection error: {0}")]
    Connection(String),

    /// Every connection up to `max_size` is reserved.
    #[error("no more pool connections available")]
    Exhausted,

    /// `release` was handed an identity the pool does not hold as reserved.
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// Closing an individual connection failed.
    #[error("close error: {0}")]
    Close(String),

    #[error("invalid pool configuration: {0}")]
    Config(String),
}
