//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use devagent_core::{expand_path, parse_args, AgentSettings};

/// Build version string with git hash and build date.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    // Format: "0.1.0 (abc1234, 2026-01-29)"
    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// Dev Agent - run a code-analysis agent over your files from the terminal
#[derive(Parser, Debug)]
#[command(name = "devagent")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Agent script, absolute or relative to a workspace root
    #[arg(long, env = "DEVAGENT_SCRIPT_PATH")]
    pub script: Option<String>,

    /// Interpreter that runs the agent script
    #[arg(long, env = "DEVAGENT_INTERPRETER")]
    pub interpreter: Option<String>,

    /// Extra arguments for the agent script, whitespace separated
    #[arg(long = "args", env = "DEVAGENT_ADDITIONAL_ARGS", allow_hyphen_values = true)]
    pub additional_args: Option<String>,

    /// Workspace root searched for the script (repeatable; default:
    /// DEVAGENT_WORKSPACE, a PATH-style list, or the current directory)
    #[arg(short, long = "workspace")]
    pub workspaces: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the agent once and print the reply
    Ask {
        /// What to ask
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// File to attach as context
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run a command against a file
    Upload {
        /// File to send
        #[arg(required = true)]
        path: PathBuf,

        /// Command to run on it
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Find @dev-agent mentions in a file and run one
    Mentions {
        /// File to scan
        #[arg(required = true)]
        path: PathBuf,

        /// Mention to run, numbered from 1
        #[arg(short, long)]
        pick: Option<usize>,
    },

    /// Print the command type a text is classified as
    Classify {
        /// Text to classify
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Start interactive REPL mode
    Repl,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Agent settings from the environment, overridden by flags.
    pub fn settings(&self) -> AgentSettings {
        let mut settings = AgentSettings::from_env();

        if let Some(script) = &self.script {
            settings = settings.with_script_path(script.as_str());
        }
        if let Some(interpreter) = &self.interpreter {
            settings = settings.with_interpreter(interpreter.as_str());
        }
        if let Some(args) = &self.additional_args {
            settings = settings.with_additional_args(parse_args(args));
        }

        if !self.workspaces.is_empty() {
            settings.workspace_roots = self
                .workspaces
                .iter()
                .map(|p| PathBuf::from(expand_path(&p.to_string_lossy())))
                .collect();
        } else if settings.workspace_roots.is_empty() {
            settings.workspace_roots = std::env::current_dir().ok().into_iter().collect();
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args enters the REPL
        let cli = Cli::parse_from(["devagent"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::parse_from(["devagent", "ask", "explain", "this", "-f", "main.py"]);
        match cli.command {
            Some(Commands::Ask { prompt, file }) => {
                assert_eq!(prompt.join(" "), "explain this");
                assert_eq!(file, Some(PathBuf::from("main.py")));
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_parse_upload() {
        let cli = Cli::parse_from(["devagent", "upload", "notes.py", "summarize", "this"]);
        match cli.command {
            Some(Commands::Upload { path, command }) => {
                assert_eq!(path, PathBuf::from("notes.py"));
                assert_eq!(command.join(" "), "summarize this");
            }
            _ => panic!("Expected Upload command"),
        }
    }

    #[test]
    fn test_cli_parse_mentions_pick() {
        let cli = Cli::parse_from(["devagent", "mentions", "lib.rs", "--pick", "2"]);
        match cli.command {
            Some(Commands::Mentions { path, pick }) => {
                assert_eq!(path, PathBuf::from("lib.rs"));
                assert_eq!(pick, Some(2));
            }
            _ => panic!("Expected Mentions command"),
        }
    }

    #[test]
    fn test_cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "devagent",
            "--script",
            "/opt/agents/agent.py",
            "--interpreter",
            "python3",
            "--args",
            "--model small",
            "-w",
            "/ws/one",
            "-w",
            "/ws/two",
            "repl",
        ]);

        let settings = cli.settings();
        assert_eq!(settings.script_path, "/opt/agents/agent.py");
        assert_eq!(settings.interpreter_path, "python3");
        assert_eq!(settings.additional_args, vec!["--model", "small"]);
        assert_eq!(
            settings.workspace_roots,
            vec![PathBuf::from("/ws/one"), PathBuf::from("/ws/two")]
        );
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["devagent", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
