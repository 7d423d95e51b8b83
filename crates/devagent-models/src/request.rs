//! Request and outcome types exchanged with the agent process.
//!
//! The agent reads a [`RequestDescriptor`] from a JSON file whose path is
//! passed on its command line, and answers through its exit code and the
//! two output streams, captured as an [`AgentOutcome`].

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Intent tag telling the agent how to treat a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Produce pseudo code for the attached file.
    PseudoCode,
    /// Explain the attached file.
    Explain,
    /// Anything else; the agent interprets the raw command.
    #[default]
    Custom,
}

impl CommandType {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::PseudoCode => "pseudo_code",
            CommandType::Explain => "explain",
            CommandType::Custom => "custom",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the agent needs to answer one command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestDescriptor {
    pub command: String,
    pub command_type: CommandType,
    #[serde(default)]
    pub file_content: String,
    #[serde(default)]
    pub file_path: String,
}

/// On-disk shape of a request. `prompt` and `input` mirror `command` and
/// `file_content` for agents written against the older field names.
#[derive(Serialize)]
struct RequestWire<'a> {
    command: &'a str,
    command_type: CommandType,
    file_content: &'a str,
    file_path: &'a str,
    prompt: &'a str,
    input: &'a str,
}

impl Serialize for RequestDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RequestWire {
            command: &self.command,
            command_type: self.command_type,
            file_content: &self.file_content,
            file_path: &self.file_path,
            prompt: &self.command,
            input: &self.file_content,
        }
        .serialize(serializer)
    }
}

impl RequestDescriptor {
    /// Creates a new request descriptor.
    pub fn new(
        command: impl Into<String>,
        command_type: CommandType,
        file_content: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            command_type,
            file_content: file_content.into(),
            file_path: file_path.into(),
        }
    }

    /// Serializes the descriptor as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Raw result of one agent process run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentOutcome {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl AgentOutcome {
    /// Creates a new outcome.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Returns true if the process exited with code zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
