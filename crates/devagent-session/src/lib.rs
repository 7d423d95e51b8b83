//! Session controller for the dev agent.
//!
//! An [`AgentSession`] owns one conversation:
//! - `SessionState` - append-only history plus the single-slot file context
//! - `Dispatcher` - drains submitted commands one at a time, in order
//! - `ResponseRouter` - appends each outcome and announces it
//!
//! Presentation layers hold the session, call its `submit*` methods and
//! render from [`SessionEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! use devagent_core::AgentSettings;
//! use devagent_session::AgentSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = AgentSession::new(AgentSettings::from_env().with_workspace_root("."));
//!     session.set_current_file("src/main.rs", "fn main() {}").await;
//!
//!     let reply = session.submit("explain this").await?.wait().await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod dispatcher;
pub mod error;
pub mod event;
pub mod router;
pub mod session;
pub mod state;

pub use dispatcher::RequestTicket;
pub use error::{Result, SessionError};
pub use event::{RequestPhase, SessionEvent};
pub use router::ResponseRouter;
pub use session::{AgentSession, WELCOME_MESSAGE};
pub use state::{SessionSnapshot, SessionState};
