//! Error types for the gateway crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running the agent.
///
/// An unresolved script is deliberately absent: it is reported as ordinary
/// output by [`AgentGateway::run`](crate::AgentGateway::run).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The agent did not finish within the configured budget.
    #[error("Agent script execution timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The agent exited with a non-zero code.
    #[error("Agent script failed with exit code {exit_code}:\n{stderr}")]
    Execution {
        /// Exit code reported by the process.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The interpreter could not be launched or awaited.
    #[error("Failed to run agent command `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request file could not be created or written.
    #[error("Failed to write request file in {path}: {source}")]
    Artifact {
        /// Directory the file was to be created in.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GatewayError {
    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }

    /// Returns the exit code for execution failures.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GatewayError::Execution { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = GatewayError::Timeout(Duration::from_secs(30));
        assert_eq!(
            err.to_string(),
            "Agent script execution timed out after 30 seconds"
        );
        assert!(err.is_timeout());
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_execution_carries_stderr_and_code() {
        let err = GatewayError::Execution {
            exit_code: 2,
            stderr: "Traceback: boom".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 2"));
        assert!(message.contains("Traceback: boom"));
        assert_eq!(err.exit_code(), Some(2));
    }
}
