//! Single-flight FIFO dispatch.
//!
//! One task per session drains the job queue. The next job starts only after
//! the current one has been routed, so outcomes land in submission order.

use std::sync::Arc;

use devagent_gateway::AgentGateway;
use devagent_models::{RequestDescriptor, RequestId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::event::{RequestPhase, SessionEvent};
use crate::router::ResponseRouter;

/// A queued agent request.
#[derive(Debug)]
pub(crate) struct Job {
    pub request_id: RequestId,
    pub descriptor: RequestDescriptor,
    /// Session epoch at submission.
    pub epoch: u64,
    pub reply: oneshot::Sender<Result<String>>,
}

/// Handle to a submitted request.
#[derive(Debug)]
pub struct RequestTicket {
    request_id: RequestId,
    reply: oneshot::Receiver<Result<String>>,
}

impl RequestTicket {
    pub(crate) fn new(request_id: RequestId, reply: oneshot::Receiver<Result<String>>) -> Self {
        Self { request_id, reply }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Wait until the request has been routed or cancelled.
    ///
    /// Resolves after the outcome is already in the history.
    pub async fn wait(self) -> Result<String> {
        self.reply.await.unwrap_or(Err(SessionError::Closed))
    }
}

/// The queue-draining task.
pub(crate) struct Dispatcher {
    gateway: Arc<AgentGateway>,
    router: ResponseRouter,
    events: broadcast::Sender<SessionEvent>,
    epoch: watch::Receiver<u64>,
}

impl Dispatcher {
    pub(crate) fn new(
        gateway: Arc<AgentGateway>,
        router: ResponseRouter,
        events: broadcast::Sender<SessionEvent>,
        epoch: watch::Receiver<u64>,
    ) -> Self {
        Self {
            gateway,
            router,
            events,
            epoch,
        }
    }

    /// Drain `jobs` until every sender is gone.
    pub(crate) async fn run(self, mut jobs: mpsc::UnboundedReceiver<Job>) {
        debug!("dispatcher started");

        while let Some(job) = jobs.recv().await {
            self.dispatch(job).await;
        }

        debug!("dispatcher stopped");
    }

    async fn dispatch(&self, job: Job) {
        let Job {
            request_id,
            descriptor,
            epoch,
            reply,
        } = job;

        // `Dispatched` and the loading indicator were announced on accept.
        if *self.epoch.borrow() != epoch {
            debug!(request_id = %request_id, "dropping request queued before cancellation");
            self.finish(&request_id, RequestPhase::Cancelled);
            let _ = reply.send(Err(SessionError::Cancelled));
            return;
        }

        // Dropping the gateway future kills the child and removes the
        // request file.
        let outcome = tokio::select! {
            result = self.gateway.run_request(&request_id, &descriptor) => Some(result),
            _ = epoch_changed(self.epoch.clone(), epoch) => None,
        };

        let (phase, value) = match outcome {
            None => {
                info!(request_id = %request_id, "request cancelled in flight");
                (RequestPhase::Cancelled, Err(SessionError::Cancelled))
            }
            Some(result) => {
                let phase = self.router.route(&request_id, epoch, &result).await;
                let value = if phase == RequestPhase::Cancelled {
                    Err(SessionError::Cancelled)
                } else {
                    result.map_err(SessionError::from)
                };
                (phase, value)
            }
        };

        self.finish(&request_id, phase);

        // The submitter may have stopped waiting.
        let _ = reply.send(value);
    }

    /// Turn the loading indicator off and settle in `phase`, then `Idle`.
    fn finish(&self, request_id: &RequestId, phase: RequestPhase) {
        debug_assert!(phase.is_terminal(), "{} is not a settled phase", phase);
        self.emit(SessionEvent::Loading {
            request_id: request_id.clone(),
            is_loading: false,
        });
        self.emit_phase(request_id, phase);
        self.emit_phase(request_id, RequestPhase::Idle);
    }

    fn emit_phase(&self, request_id: &RequestId, phase: RequestPhase) {
        self.emit(SessionEvent::Phase {
            request_id: request_id.clone(),
            phase,
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Resolves once the session epoch moves past `submitted`, or the session
/// is gone.
async fn epoch_changed(mut epoch: watch::Receiver<u64>, submitted: u64) {
    loop {
        if *epoch.borrow_and_update() != submitted {
            return;
        }
        if epoch.changed().await.is_err() {
            return;
        }
    }
}
