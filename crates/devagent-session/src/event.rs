//! Session events.

use std::fmt;

use devagent_models::{FileContext, RequestId};

/// Lifecycle of one submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    /// Nothing in progress for this request; it has settled.
    Idle,
    /// Accepted by the session; the loading indicator is on until it settles.
    Dispatched,
    /// The agent answered and the answer was appended.
    Completed,
    /// The agent failed and the error was appended.
    Failed,
    /// The agent ran past its budget and the timeout was appended.
    TimedOut,
    /// Dropped by `clear` or `cancel`; nothing was appended.
    Cancelled,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Idle => "idle",
            RequestPhase::Dispatched => "dispatched",
            RequestPhase::Completed => "completed",
            RequestPhase::Failed => "failed",
            RequestPhase::TimedOut => "timed_out",
            RequestPhase::Cancelled => "cancelled",
        }
    }

    /// Returns true for the phases a request settles in.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestPhase::Completed
                | RequestPhase::Failed
                | RequestPhase::TimedOut
                | RequestPhase::Cancelled
        )
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The history changed; re-render it.
    Updated {
        /// History length after the change.
        history_len: usize,
    },
    /// The file slot changed. `None` after a clear.
    FileContextChanged {
        file: Option<FileContext>,
    },
    /// Loading indicator toggled for a request.
    Loading {
        request_id: RequestId,
        is_loading: bool,
    },
    /// Display text for a routed outcome.
    Response {
        request_id: RequestId,
        text: String,
        is_error: bool,
    },
    /// A request moved to a new phase.
    Phase {
        request_id: RequestId,
        phase: RequestPhase,
    },
}
