//! Folds gateway outcomes back into the conversation.

use std::sync::Arc;

use devagent_gateway::GatewayError;
use devagent_models::{ChatMessage, RequestId};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

use crate::event::{RequestPhase, SessionEvent};
use crate::state::SessionState;

/// Appends agent outcomes to the history and announces them.
#[derive(Debug, Clone)]
pub struct ResponseRouter {
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ResponseRouter {
    /// Creates a new router.
    pub fn new(state: Arc<RwLock<SessionState>>, events: broadcast::Sender<SessionEvent>) -> Self {
        Self { state, events }
    }

    /// Route one outcome and return the phase the request settled in.
    ///
    /// `epoch` is the session epoch the request was submitted in. If the
    /// session has been cleared or cancelled since, nothing is appended and
    /// the request settles as [`RequestPhase::Cancelled`]. The check and the
    /// append happen under the same write lock.
    pub async fn route(
        &self,
        request_id: &RequestId,
        epoch: u64,
        outcome: &Result<String, GatewayError>,
    ) -> RequestPhase {
        let (text, is_error, phase) = match outcome {
            Ok(text) => (text.clone(), false, RequestPhase::Completed),
            Err(e) if e.is_timeout() => (format!("Error: {}", e), true, RequestPhase::TimedOut),
            Err(e) => (format!("Error: {}", e), true, RequestPhase::Failed),
        };

        let mut state = self.state.write().await;
        if state.epoch() != epoch {
            debug!(
                request_id = %request_id,
                submitted_epoch = epoch,
                current_epoch = state.epoch(),
                "discarding outcome from before cancellation"
            );
            return RequestPhase::Cancelled;
        }
        state.push(ChatMessage::agent(text.clone()));
        let history_len = state.len();

        trace!(request_id = %request_id, phase = %phase, history_len, "outcome routed");

        // Sent under the lock. No subscribers is fine.
        let _ = self.events.send(SessionEvent::Response {
            request_id: request_id.clone(),
            text,
            is_error,
        });
        let _ = self.events.send(SessionEvent::Updated { history_len });

        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devagent_models::MessageRole;
    use std::time::Duration;

    fn router() -> (
        ResponseRouter,
        Arc<RwLock<SessionState>>,
        broadcast::Receiver<SessionEvent>,
    ) {
        let state = Arc::new(RwLock::new(SessionState::new()));
        let (tx, rx) = broadcast::channel(16);
        (ResponseRouter::new(Arc::clone(&state), tx), state, rx)
    }

    #[tokio::test]
    async fn test_route_success_appends_agent_message() {
        let (router, state, mut rx) = router();
        let id = RequestId::new();

        let phase = router.route(&id, 0, &Ok("ok".to_string())).await;

        assert_eq!(phase, RequestPhase::Completed);
        let state = state.read().await;
        assert_eq!(state.len(), 1);
        assert_eq!(state.history()[0].role(), MessageRole::Agent);
        assert_eq!(state.history()[0].content(), "ok");

        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Response {
                request_id: id,
                text: "ok".to_string(),
                is_error: false,
            }
        );
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Updated { history_len: 1 });
    }

    #[tokio::test]
    async fn test_route_failure_prefixes_error() {
        let (router, state, mut rx) = router();
        let outcome = Err(GatewayError::Execution {
            exit_code: 1,
            stderr: "boom".to_string(),
        });

        let phase = router.route(&RequestId::new(), 0, &outcome).await;

        assert_eq!(phase, RequestPhase::Failed);
        let content = state.read().await.history()[0].content().to_string();
        assert!(content.starts_with("Error: "));
        assert!(content.contains("boom"));

        match rx.recv().await.unwrap() {
            SessionEvent::Response { is_error, .. } => assert!(is_error),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_timeout_phase() {
        let (router, state, _rx) = router();
        let outcome = Err(GatewayError::Timeout(Duration::from_secs(30)));

        let phase = router.route(&RequestId::new(), 0, &outcome).await;

        assert_eq!(phase, RequestPhase::TimedOut);
        assert_eq!(
            state.read().await.history()[0].content(),
            "Error: Agent script execution timed out after 30 seconds"
        );
    }

    #[tokio::test]
    async fn test_route_stale_epoch_is_dropped() {
        let (router, state, mut rx) = router();
        state.write().await.clear();

        let phase = router.route(&RequestId::new(), 0, &Ok("late".to_string())).await;

        assert_eq!(phase, RequestPhase::Cancelled);
        assert!(state.read().await.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
