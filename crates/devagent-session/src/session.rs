//! The session handle owned by a presentation layer.

use std::fmt;
use std::sync::Arc;

use devagent_core::{classify, strip_mention, AgentSettings, MENTION_PREFIX};
use devagent_gateway::AgentGateway;
use devagent_models::{
    ChatMessage, CommandType, FileContext, MessageRole, RequestDescriptor, RequestId,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dispatcher::{Dispatcher, Job, RequestTicket};
use crate::error::{Result, SessionError};
use crate::event::{RequestPhase, SessionEvent};
use crate::router::ResponseRouter;
use crate::state::{SessionSnapshot, SessionState};

/// First message of every new session.
pub const WELCOME_MESSAGE: &str = "Welcome to Dev Agent! You can ask questions about your code, \
     use @dev-agent commands, or upload files for analysis.";

const EVENT_CAPACITY: usize = 256;

/// One conversation with the agent.
///
/// Commands are queued and run one at a time in submission order. All
/// history mutations go through a single lock.
///
/// Must be created inside a Tokio runtime; the dispatcher runs as a spawned
/// task and is aborted when the session is dropped.
pub struct AgentSession {
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    gateway: Arc<AgentGateway>,
    jobs: mpsc::UnboundedSender<Job>,
    epoch_tx: watch::Sender<u64>,
    worker: JoinHandle<()>,
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("gateway", &self.gateway)
            .field("subscribers", &self.events.receiver_count())
            .field("closed", &self.jobs.is_closed())
            .finish()
    }
}

impl AgentSession {
    /// Creates a session that runs the real agent.
    pub fn new(settings: AgentSettings) -> Self {
        Self::with_gateway(AgentGateway::new(settings))
    }

    /// Creates a session around an existing gateway.
    pub fn with_gateway(gateway: AgentGateway) -> Self {
        let mut state = SessionState::new();
        state.push(ChatMessage::system(WELCOME_MESSAGE));
        let epoch = state.epoch();
        let state = Arc::new(RwLock::new(state));

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (jobs, jobs_rx) = mpsc::unbounded_channel();
        let (epoch_tx, epoch_rx) = watch::channel(epoch);
        let gateway = Arc::new(gateway);

        let dispatcher = Dispatcher::new(
            Arc::clone(&gateway),
            ResponseRouter::new(Arc::clone(&state), events.clone()),
            events.clone(),
            epoch_rx,
        );
        let worker = tokio::spawn(dispatcher.run(jobs_rx));

        debug!("session created");

        Self {
            state,
            events,
            gateway,
            jobs,
            epoch_tx,
            worker,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns the gateway settings.
    pub fn settings(&self) -> &AgentSettings {
        self.gateway.settings()
    }

    /// Append a message to the history.
    pub async fn append_message(
        &self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> ChatMessage {
        let mut state = self.state.write().await;
        let message = state.append(role, content);
        self.emit(SessionEvent::Updated {
            history_len: state.len(),
        });
        message
    }

    /// Make `path` the current file and note it in the history.
    pub async fn set_current_file(
        &self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> FileContext {
        let mut state = self.state.write().await;
        let file = state.set_current_file(path, content).clone();

        info!(path = %file.path, bytes = file.content.len(), "file context set");

        self.emit(SessionEvent::FileContextChanged {
            file: Some(file.clone()),
        });
        self.emit(SessionEvent::Updated {
            history_len: state.len(),
        });
        file
    }

    /// Empty the history and the file slot, cancelling every pending request.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let epoch = state.clear();
        self.epoch_tx.send_replace(epoch);

        info!(epoch, "session cleared");

        self.emit(SessionEvent::FileContextChanged { file: None });
        self.emit(SessionEvent::Updated { history_len: 0 });
    }

    /// Cancel the in-flight request and everything queued behind it.
    ///
    /// The history is left as it is.
    pub async fn cancel(&self) {
        let mut state = self.state.write().await;
        let epoch = state.invalidate();
        self.epoch_tx.send_replace(epoch);
        info!(epoch, "pending requests cancelled");
    }

    /// Consistent copy of the history and the file slot.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.state.read().await.history().to_vec()
    }

    pub async fn current_file(&self) -> Option<FileContext> {
        self.state.read().await.current_file().cloned()
    }

    /// Submit a prompt typed into the chat.
    ///
    /// The raw prompt is recorded; a leading `@dev-agent` is stripped before
    /// classification. The current file, if any, goes along.
    pub async fn submit(&self, prompt: impl Into<String>) -> Result<RequestTicket> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        let command = strip_mention(&prompt).to_string();
        let command_type = classify(&command);

        self.enqueue(prompt, None, |state| {
            let (content, path) = state
                .current_file()
                .map(|f| (f.content.clone(), f.path.clone()))
                .unwrap_or_default();
            RequestDescriptor::new(command, command_type, content, path)
        })
        .await
    }

    /// Submit an `@dev-agent` mention found in a document.
    ///
    /// The document becomes the current file.
    pub async fn submit_mention(
        &self,
        command: impl Into<String>,
        file_content: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Result<RequestTicket> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        let file = FileContext::new(file_path, file_content);
        let command_type = classify(&command);
        let message = format!("{} {}", MENTION_PREFIX, command);
        let descriptor =
            RequestDescriptor::new(command, command_type, file.content.clone(), file.path.clone());

        self.enqueue(message, Some(file), |_| descriptor).await
    }

    /// Submit an `@dev-agent` command typed next to an editor.
    ///
    /// Always `custom`, never reclassified. The editor's file goes along
    /// under its base name and does not become the current file.
    pub async fn submit_command(
        &self,
        command: impl Into<String>,
        editor_file: Option<FileContext>,
    ) -> Result<RequestTicket> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        let message = format!("{} {}", MENTION_PREFIX, command);
        let (content, name) = editor_file
            .map(|f| {
                let name = f.file_name().to_string();
                (f.content, name)
            })
            .unwrap_or_default();

        self.enqueue(message, None, |_| {
            RequestDescriptor::new(command, CommandType::Custom, content, name)
        })
        .await
    }

    /// Submit a command against an uploaded file.
    ///
    /// Uploads do not replace the current file and are always `custom`.
    pub async fn submit_upload(
        &self,
        file_name: impl Into<String>,
        file_content: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<RequestTicket> {
        let file_name = file_name.into();
        let file_content = file_content.into();
        let command = command.into();
        if command.trim().is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        let message = format!("{} {} (File: {})", MENTION_PREFIX, command, file_name);

        self.enqueue(message, None, |_| {
            RequestDescriptor::new(command, CommandType::Custom, file_content, file_name)
        })
        .await
    }

    /// Submit code or a command typed next to an editor.
    ///
    /// Always `custom`; the editor's file, if given, goes along.
    pub async fn submit_code(
        &self,
        code: impl Into<String>,
        editor_file: Option<FileContext>,
    ) -> Result<RequestTicket> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        let command = strip_mention(&code).to_string();
        let (content, path) = editor_file
            .map(|f| (f.content, f.path))
            .unwrap_or_default();

        self.enqueue(code, None, |_| {
            RequestDescriptor::new(command, CommandType::Custom, content, path)
        })
        .await
    }

    /// Run the agent directly, bypassing the queue and the history.
    pub async fn run(
        &self,
        command: &str,
        command_type: CommandType,
        file_content: &str,
        file_path: &str,
    ) -> Result<String> {
        Ok(self
            .gateway
            .run(command, command_type, file_content, file_path)
            .await?)
    }

    /// Accept one request in a single critical section.
    ///
    /// The job is queued first; the user turn and the new current file are
    /// applied only once the dispatcher has it, so a closed session leaves
    /// the state untouched. The request enters `Dispatched` before the lock
    /// is released.
    async fn enqueue<F>(
        &self,
        user_message: String,
        new_file: Option<FileContext>,
        build: F,
    ) -> Result<RequestTicket>
    where
        F: FnOnce(&SessionState) -> RequestDescriptor,
    {
        let request_id = RequestId::new();
        let (reply_tx, reply_rx) = oneshot::channel();

        let mut state = self.state.write().await;
        let descriptor = build(&*state);

        debug!(
            request_id = %request_id,
            command_type = %descriptor.command_type,
            epoch = state.epoch(),
            "request queued"
        );

        let job = Job {
            request_id: request_id.clone(),
            descriptor,
            epoch: state.epoch(),
            reply: reply_tx,
        };
        self.jobs.send(job).map_err(|_| SessionError::Closed)?;

        state.push(ChatMessage::user(user_message));
        if let Some(file) = new_file {
            state.replace_current_file(file.clone());
            self.emit(SessionEvent::FileContextChanged { file: Some(file) });
        }
        self.emit(SessionEvent::Updated {
            history_len: state.len(),
        });
        self.emit(SessionEvent::Phase {
            request_id: request_id.clone(),
            phase: RequestPhase::Dispatched,
        });
        self.emit(SessionEvent::Loading {
            request_id: request_id.clone(),
            is_loading: true,
        });

        Ok(RequestTicket::new(request_id, reply_rx))
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

impl Drop for AgentSession {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
