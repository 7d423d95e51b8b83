//! Agent gateway for the dev agent.
//!
//! This crate runs the external analysis agent once per command:
//! - `ScriptResolver` - finds the agent script in a fixed search order
//! - `RequestArtifact` - the uniquely named request file, deleted on drop
//! - `ProcessRunner` - the seam that actually launches the process
//! - `AgentGateway` - ties the above together and enforces the timeout
//!
//! # Example
//!
//! ```ignore
//! use devagent_core::AgentSettings;
//! use devagent_gateway::AgentGateway;
//! use devagent_models::CommandType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = AgentSettings::from_env().with_workspace_root(".");
//!     let gateway = AgentGateway::new(settings);
//!
//!     let reply = gateway
//!         .run("explain this", CommandType::Explain, "fn main() {}", "main.rs")
//!         .await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! # Cleanup
//!
//! Every call owns exactly one request file. It is removed when the call
//! returns, fails, times out, or when the call's future is dropped before
//! completion; the child process is killed in the last two cases.

pub mod artifact;
pub mod error;
pub mod gateway;
pub mod resolver;
pub mod runner;

pub use artifact::RequestArtifact;
pub use error::{GatewayError, Result};
pub use gateway::{format_outcome, AgentGateway, NO_OUTPUT_MESSAGE};
pub use resolver::{resolve_interpreter, Resolution, ScriptResolver};
pub use runner::{Invocation, ProcessRunner, TokioProcessRunner};
