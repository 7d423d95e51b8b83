//! The agent gateway: one command in, one result out.

use std::fmt;
use std::sync::Arc;

use devagent_core::AgentSettings;
use devagent_models::{AgentOutcome, CommandType, RequestDescriptor, RequestId};
use tracing::{debug, info, warn};

use crate::artifact::RequestArtifact;
use crate::error::{GatewayError, Result};
use crate::resolver::ScriptResolver;
use crate::runner::{display_command, Invocation, ProcessRunner, TokioProcessRunner};

/// Returned when the agent succeeds without printing anything.
pub const NO_OUTPUT_MESSAGE: &str = "Agent script executed successfully with no output.";

/// Header separating agent output from warnings printed on stderr.
const WARNINGS_HEADER: &str = "Warnings/Errors:";

/// Turn a finished process into the text shown to the user.
///
/// - non-zero exit: [`GatewayError::Execution`] with stderr attached
/// - zero exit with stderr: stdout followed by a warnings section
/// - zero exit, no output at all: [`NO_OUTPUT_MESSAGE`]
pub fn format_outcome(outcome: AgentOutcome) -> Result<String> {
    if !outcome.is_success() {
        return Err(GatewayError::Execution {
            exit_code: outcome.exit_code,
            stderr: outcome.stderr,
        });
    }

    if !outcome.stderr.is_empty() {
        return Ok(format!(
            "{}\n\n{}\n{}",
            outcome.stdout, WARNINGS_HEADER, outcome.stderr
        ));
    }

    if outcome.stdout.is_empty() {
        Ok(NO_OUTPUT_MESSAGE.to_string())
    } else {
        Ok(outcome.stdout)
    }
}

/// Runs the external agent for one command at a time per call.
///
/// The gateway holds no per-call state, so concurrent calls are independent;
/// serializing them is the session's job.
pub struct AgentGateway {
    settings: AgentSettings,
    resolver: ScriptResolver,
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for AgentGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentGateway")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl AgentGateway {
    /// Creates a gateway that launches real processes.
    pub fn new(settings: AgentSettings) -> Self {
        Self::with_runner(settings, Arc::new(TokioProcessRunner::new()))
    }

    /// Creates a gateway with a custom process runner.
    pub fn with_runner(settings: AgentSettings, runner: Arc<dyn ProcessRunner>) -> Self {
        let resolver = ScriptResolver::from_settings(&settings);
        Self {
            settings,
            resolver,
            runner,
        }
    }

    /// Returns the settings.
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run the agent for one command.
    ///
    /// An unresolved script is not an error: the returned text names the
    /// missing path and the command that would have run, and no process is
    /// started.
    pub async fn run(
        &self,
        command: &str,
        command_type: CommandType,
        file_content: &str,
        file_path: &str,
    ) -> Result<String> {
        let descriptor = RequestDescriptor::new(command, command_type, file_content, file_path);
        self.run_request(&RequestId::new(), &descriptor).await
    }

    /// Run the agent for a prepared request.
    ///
    /// If the returned future is dropped early the child is killed and the
    /// request file is removed.
    pub async fn run_request(
        &self,
        request_id: &RequestId,
        descriptor: &RequestDescriptor,
    ) -> Result<String> {
        let resolution = self.resolver.resolve(&self.settings.script_path);
        if !resolution.is_found() {
            warn!(
                request_id = %request_id,
                script = %resolution.path().display(),
                "agent script not found, not spawning"
            );
            return Ok(self.missing_script_message(&resolution.path().display().to_string()));
        }

        let artifact = RequestArtifact::create(&self.settings.temp_dir, descriptor)?;

        let invocation = Invocation {
            interpreter: self.settings.interpreter_path.clone(),
            script: resolution.path().to_path_buf(),
            input_file: artifact.to_path_buf(),
            extra_args: self.settings.additional_args.clone(),
        };

        debug!(
            request_id = %request_id,
            command_type = %descriptor.command_type,
            command = %invocation.command_line(),
            "dispatching to agent"
        );

        let result =
            match tokio::time::timeout(self.settings.timeout, self.runner.run(&invocation)).await {
                Ok(Ok(outcome)) => format_outcome(outcome),
                Ok(Err(source)) => Err(GatewayError::Spawn {
                    command: invocation.command_line(),
                    source,
                }),
                Err(_) => Err(GatewayError::Timeout(self.settings.timeout)),
            };

        match &result {
            Ok(_) => info!(request_id = %request_id, "agent completed"),
            Err(e) => warn!(request_id = %request_id, error = %e, "agent failed"),
        }

        drop(artifact);
        result
    }

    fn missing_script_message(&self, script: &str) -> String {
        let command = display_command(
            &self.settings.interpreter_path,
            script,
            None,
            &self.settings.additional_args,
        );
        format!(
            "Error: Agent script not found at {}\n\n\
             Command that would have been executed:\n{}\n\n\
             Please check the 'script_path' setting.",
            script, command
        )
    }
}
