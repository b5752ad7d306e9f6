//! Error types for delivery sessions.

use std::io;
use std::time::Duration;

use crate::session::Stage;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal failures of a delivery session.
///
/// Every variant tears the session down; there is no retry or
/// partial-success state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the relay connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No data within the configured window on a pending operation.
    #[error("relay did not respond within {0:?}")]
    Timeout(Duration),

    /// The relay closed the connection mid-session.
    #[error("connection closed by relay")]
    Closed,

    /// A reply exceeded the receive buffer before a full line arrived.
    #[error("relay reply overflowed the receive buffer")]
    BufferOverflow,

    /// The relay answered a stage with an unexpected status code.
    #[error("unexpected reply in {stage:?} stage: {reply}")]
    Protocol {
        /// Stage the session was in when the reply arrived.
        stage: Stage,
        /// Raw reply text as received.
        reply: String,
    },
}

impl Error {
    /// Creates a protocol error from the offending stage and raw reply.
    #[must_use]
    pub fn protocol(stage: Stage, reply: impl Into<String>) -> Self {
        Self::Protocol {
            stage,
            reply: reply.into(),
        }
    }
}
