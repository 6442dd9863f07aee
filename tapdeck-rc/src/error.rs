//! Error types for tapdeck-rc
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Engine call failures are deliberately separate from the
//! main error enum: they are recoverable everywhere (degrade to last-known
//! rendering, retry on the next cycle) and must never tear a view down.

use thiserror::Error;

/// Failure of a single engine call
///
/// Both variants are recoverable-locally: callers treat them as a no-op
/// and rely on the next scheduled tick or user action to retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// No live connection to the engine process
    #[error("engine unavailable")]
    Unavailable,

    /// Connection present, but the call did not complete within the
    /// bounded per-call timeout
    #[error("engine call timed out")]
    Timeout,
}

/// Convenience Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Main error type for tapdeck-rc
#[derive(Error, Debug)]
pub enum Error {
    /// Engine call failure surfaced outside the retry loops
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Queue window construction failure
    ///
    /// The one fatal-to-view condition: a paging window cannot be built
    /// from partial data, so the controlling view must close.
    #[error("Queue window error: {0}")]
    QueueWindow(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection establishment error
    #[error("Connect error: {0}")]
    Connect(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the tapdeck-rc Error
pub type Result<T> = std::result::Result<T, Error>;
