//! Error types for the session crate.

use devagent_gateway::GatewayError;
use thiserror::Error;

/// Errors a submitted request can settle with.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The agent run failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The request was cancelled by `clear` or `cancel` before it was routed.
    #[error("request cancelled")]
    Cancelled,

    /// The command was empty after trimming.
    #[error("command is empty")]
    EmptyCommand,

    /// The dispatcher is no longer running.
    #[error("session closed")]
    Closed,
}

impl SessionError {
    /// Returns true if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
