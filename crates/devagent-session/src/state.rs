//! In-memory conversation state.
//!
//! `SessionState` is plain data. Every method is a single transition, so a
//! caller holding the session lock for the duration of one call never
//! observes a partially applied operation.

use devagent_models::{ChatMessage, FileContext, MessageRole};

/// A consistent copy of the conversation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub history: Vec<ChatMessage>,
    pub current_file: Option<FileContext>,
}

/// Chat history plus the single-slot file context.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    history: Vec<ChatMessage>,
    current_file: Option<FileContext>,
    /// Bumped on `clear` and `invalidate`; outcomes tagged with an older
    /// epoch are dropped.
    epoch: u64,
}

impl SessionState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the history.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> ChatMessage {
        self.push(ChatMessage::new(role, content))
    }

    /// Append an already built message.
    pub fn push(&mut self, message: ChatMessage) -> ChatMessage {
        self.history.push(message.clone());
        message
    }

    /// Replace the file slot and record a `File loaded` notice.
    pub fn set_current_file(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> &FileContext {
        let file = FileContext::new(path, content);
        self.push(ChatMessage::system(format!(
            "File loaded: {}",
            file.file_name()
        )));
        self.current_file.insert(file)
    }

    /// Replace the file slot without touching the history.
    pub fn replace_current_file(&mut self, file: FileContext) {
        self.current_file = Some(file);
    }

    /// Empty the history and the file slot.
    ///
    /// Returns the new epoch.
    pub fn clear(&mut self) -> u64 {
        self.history.clear();
        self.current_file = None;
        self.invalidate()
    }

    /// Start a new epoch without clearing anything.
    ///
    /// Returns the new epoch.
    pub fn invalidate(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn current_file(&self) -> Option<&FileContext> {
        self.current_file.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Copy the history and file slot.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            history: self.history.clone(),
            current_file: self.current_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut state = SessionState::new();
        state.append(MessageRole::User, "one");
        state.append(MessageRole::Agent, "two");
        state.append(MessageRole::User, "three");

        let contents: Vec<_> = state.history().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(state.history()[1].role(), MessageRole::Agent);
    }

    #[test]
    fn test_push_keeps_message_identity() {
        let mut state = SessionState::new();
        let message = ChatMessage::agent("done");

        let stored = state.push(message.clone());

        assert_eq!(stored, message);
        assert_eq!(state.history()[0].id(), message.id());
        assert_eq!(state.history()[0].role(), MessageRole::Agent);
    }

    #[test]
    fn test_set_current_file_adds_notice() {
        let mut state = SessionState::new();
        state.set_current_file("/src/app/main.py", "print(1)");

        assert_eq!(state.current_file().unwrap().path, "/src/app/main.py");
        assert_eq!(state.len(), 1);
        assert_eq!(state.history()[0].role(), MessageRole::System);
        assert_eq!(state.history()[0].content(), "File loaded: main.py");
    }

    #[test]
    fn test_new_file_discards_previous() {
        let mut state = SessionState::new();
        state.set_current_file("a.py", "a");
        state.set_current_file("b.py", "b");

        let file = state.current_file().unwrap();
        assert_eq!(file.path, "b.py");
        assert_eq!(file.content, "b");
    }

    #[test]
    fn test_replace_current_file_is_silent() {
        let mut state = SessionState::new();
        state.replace_current_file(FileContext::new("a.py", "a"));

        assert!(state.is_empty());
        assert_eq!(state.current_file().unwrap().path, "a.py");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = SessionState::new();
        state.append(MessageRole::User, "hi");
        state.set_current_file("a.py", "a");
        let before = state.epoch();

        let epoch = state.clear();

        assert!(state.is_empty());
        assert!(state.current_file().is_none());
        assert_eq!(epoch, before + 1);
        assert_eq!(state.epoch(), epoch);
    }

    #[test]
    fn test_invalidate_keeps_history() {
        let mut state = SessionState::new();
        state.append(MessageRole::User, "hi");

        let epoch = state.invalidate();

        assert_eq!(epoch, 1);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut state = SessionState::new();
        state.set_current_file("a.py", "a");
        let snapshot = state.snapshot();

        state.clear();

        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.current_file.unwrap().path, "a.py");
    }
}
