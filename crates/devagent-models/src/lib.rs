//! Core data models for the dev agent.
//!
//! This crate provides the data types shared by the gateway, the session
//! controller and the presentation adapters: chat messages, the single-slot
//! file context, the request descriptor written for the agent process and
//! the raw outcome read back from it.

pub mod context;
pub mod ids;
pub mod message;
pub mod request;

// Re-export main types
pub use context::FileContext;
pub use ids::{MessageId, RequestId};
pub use message::{ChatMessage, MessageRole};
pub use request::{AgentOutcome, CommandType, RequestDescriptor};
