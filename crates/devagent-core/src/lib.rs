//! Dev agent core - shared logic for every dev agent interface.
//!
//! - **classifier**: Map free-text commands to a [`CommandType`] tag
//! - **mention**: Find and strip `@dev-agent` mentions
//! - **config**: Agent settings and directory helpers
//!
//! [`CommandType`]: devagent_models::CommandType

pub mod classifier;
pub mod config;
pub mod mention;

pub use classifier::classify;
pub use config::{
    config_dir, default_install_dir, env_file, expand_path, history_file, parse_args,
    parse_workspace_roots, request_temp_dir, state_dir, AgentSettings,
};
pub use mention::{find_mentions, strip_mention, Mention, MENTION_PREFIX};
