//! Chat message types.
//!
//! Messages are immutable once created: fields are private and only exposed
//! through accessors, so a message stored in the session history can never
//! be edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::MessageId;

/// Who authored a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Typed by the user.
    User,
    /// Produced by the agent process (or an error normalized for display).
    Agent,
    /// Produced by the controller itself (welcome text, file loaded notices).
    System,
}

impl MessageRole {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
            MessageRole::System => "system",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    role: MessageRole,
    content: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a new message stamped with the current time.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an agent message.
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Agent, content)
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role(), MessageRole::User);
        assert_eq!(user.content(), "Hello");

        let agent = ChatMessage::agent("Hi there");
        assert_eq!(agent.role(), MessageRole::Agent);

        let system = ChatMessage::system("Welcome");
        assert_eq!(system.role(), MessageRole::System);
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&MessageRole::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
        assert_eq!(MessageRole::System.to_string(), "system");
    }

    #[test]
    fn test_message_timestamps_are_ordered() {
        let first = ChatMessage::user("a");
        let second = ChatMessage::user("b");
        assert!(second.timestamp() >= first.timestamp());
        assert_ne!(first.id(), second.id());
    }
}
