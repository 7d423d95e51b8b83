//! Process runner seam.
//!
//! The gateway never touches `tokio::process` directly; it goes through
//! [`ProcessRunner`] so callers can substitute the launch step.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use devagent_models::AgentOutcome;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::resolver::resolve_interpreter;

/// Flag that passes the request file to the agent.
pub const INPUT_FILE_FLAG: &str = "--input-file";

/// One fully resolved agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Interpreter as configured.
    pub interpreter: String,
    /// Resolved agent script.
    pub script: PathBuf,
    /// Request artifact path.
    pub input_file: PathBuf,
    /// Extra arguments appended last.
    pub extra_args: Vec<String>,
}

impl Invocation {
    /// Arguments passed to the interpreter.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![
            self.script.clone().into_os_string(),
            OsString::from(INPUT_FILE_FLAG),
            self.input_file.clone().into_os_string(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    /// Human-readable command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        display_command(
            &self.interpreter,
            &self.script.display().to_string(),
            Some(&self.input_file.display().to_string()),
            &self.extra_args,
        )
    }
}

/// Render a command line the way a user would type it.
pub fn display_command(
    interpreter: &str,
    script: &str,
    input_file: Option<&str>,
    extra_args: &[String],
) -> String {
    let mut line = format!("{} \"{}\"", interpreter, script);
    if let Some(input) = input_file {
        line.push_str(&format!(" {} \"{}\"", INPUT_FILE_FLAG, input));
    }
    if !extra_args.is_empty() {
        line.push(' ');
        line.push_str(&extra_args.join(" "));
    }
    line
}

/// Launches the agent and waits for it to exit.
///
/// Implementations must stop the process if the returned future is dropped
/// before it completes; the gateway relies on that for timeouts and
/// cancellation.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation to completion and capture both output streams.
    async fn run(&self, invocation: &Invocation) -> std::io::Result<AgentOutcome>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<AgentOutcome> {
        let program = resolve_interpreter(&invocation.interpreter);
        debug!(program = %program.display(), command = %invocation.command_line(), "spawning agent");

        let child = Command::new(&program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = child.wait_with_output().await?;
        let exit_code = output.status.code().unwrap_or(-1);

        trace!(
            exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "agent exited"
        );

        Ok(AgentOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
