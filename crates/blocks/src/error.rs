//! Errors raised by event sinks.

use thiserror::Error;

/// A sink could not acquire or release its output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("sink is already open")]
    AlreadyOpen,

    #[error("output unavailable: {0}")]
    Unavailable(String),
}
