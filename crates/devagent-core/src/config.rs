//! Agent settings and directory helpers.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.dev-agent/
//! ├── config/       # .env.local with DEVAGENT_* overrides
//! └── history.txt   # REPL line history
//!
//! $TMPDIR/dev-agent/   # one request_*.json per in-flight agent call
//! ```
//!
//! # Environment Variables
//!
//! - `DEVAGENT_STATE_DIR`: Override the base state directory
//! - `DEVAGENT_TEMP_DIR`: Override the request artifact directory
//! - `DEVAGENT_SCRIPT_PATH`: Agent script (default `agent.py`)
//! - `DEVAGENT_INTERPRETER`: Interpreter used to run the script (default `python`)
//! - `DEVAGENT_ADDITIONAL_ARGS`: Extra whitespace-separated script arguments
//! - `DEVAGENT_WORKSPACE`: Workspace roots, separated like `PATH`

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use tracing::debug;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "DEVAGENT_STATE_DIR";

/// Environment variable for custom request artifact directory.
pub const TEMP_DIR_ENV: &str = "DEVAGENT_TEMP_DIR";

/// Environment variable for the agent script path.
pub const SCRIPT_PATH_ENV: &str = "DEVAGENT_SCRIPT_PATH";

/// Environment variable for the interpreter.
pub const INTERPRETER_ENV: &str = "DEVAGENT_INTERPRETER";

/// Environment variable for extra script arguments.
pub const ADDITIONAL_ARGS_ENV: &str = "DEVAGENT_ADDITIONAL_ARGS";

/// Environment variable for workspace roots.
pub const WORKSPACE_ENV: &str = "DEVAGENT_WORKSPACE";

/// Default agent script, resolved against workspace roots and the install dir.
pub const DEFAULT_SCRIPT_PATH: &str = "agent.py";

/// Default interpreter, resolved through `PATH`.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Wall-clock budget for one agent run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_STATE_DIR: &str = ".dev-agent";
const CONFIG_SUBDIR: &str = "config";
const TEMP_SUBDIR: &str = "dev-agent";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the dev agent state directory.
///
/// 1. `DEVAGENT_STATE_DIR` environment variable if set
/// 2. `~/.dev-agent` if home directory is available
/// 3. `.dev-agent` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the .env.local file path.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Get the REPL history file path.
pub fn history_file() -> PathBuf {
    state_dir().join("history.txt")
}

/// Directory that holds request artifacts while an agent call is running.
///
/// Defaults to `$TMPDIR/dev-agent` or `DEVAGENT_TEMP_DIR` env var.
pub fn request_temp_dir() -> PathBuf {
    std::env::var(TEMP_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join(TEMP_SUBDIR))
}

/// Directory the running binary was installed in.
///
/// Falls back to the current directory when the executable path is unknown.
pub fn default_install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand `~` and environment variables in a configured path.
///
/// Unknown variables leave the input untouched.
pub fn expand_path(raw: &str) -> String {
    match shellexpand::full(raw) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            debug!(path = %raw, error = %e, "path expansion failed, using raw value");
            shellexpand::tilde(raw).into_owned()
        }
    }
}

/// Split a configured argument string on whitespace.
pub fn parse_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(String::from).collect()
}

/// Split a `PATH`-style list of workspace roots, expanding each entry.
///
/// Empty entries are skipped.
pub fn parse_workspace_roots(raw: &str) -> Vec<PathBuf> {
    std::env::split_paths(raw)
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| PathBuf::from(expand_path(&p.to_string_lossy())))
        .collect()
}

/// Settings consumed by the agent gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Agent script, absolute or relative to a workspace root / install dir.
    pub script_path: String,
    /// Interpreter that runs the script.
    pub interpreter_path: String,
    /// Extra arguments appended after `--input-file <path>`.
    pub additional_args: Vec<String>,
    /// Wall-clock budget for one run.
    pub timeout: Duration,
    /// Workspace roots searched in order for a relative script path.
    pub workspace_roots: Vec<PathBuf>,
    /// Install location; `<install_dir>/scripts/<script>` is the last resort.
    pub install_dir: PathBuf,
    /// Where request artifacts are written.
    pub temp_dir: PathBuf,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            script_path: DEFAULT_SCRIPT_PATH.to_string(),
            interpreter_path: DEFAULT_INTERPRETER.to_string(),
            additional_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            workspace_roots: Vec::new(),
            install_dir: default_install_dir(),
            temp_dir: request_temp_dir(),
        }
    }
}

impl AgentSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates default settings overlaid with `DEVAGENT_*` environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(script) = std::env::var(SCRIPT_PATH_ENV) {
            settings.script_path = expand_path(&script);
        }
        if let Ok(interpreter) = std::env::var(INTERPRETER_ENV) {
            settings.interpreter_path = expand_path(&interpreter);
        }
        if let Ok(args) = std::env::var(ADDITIONAL_ARGS_ENV) {
            settings.additional_args = parse_args(&args);
        }
        if let Ok(roots) = std::env::var(WORKSPACE_ENV) {
            settings.workspace_roots = parse_workspace_roots(&roots);
        }

        debug!(
            script = %settings.script_path,
            interpreter = %settings.interpreter_path,
            args = ?settings.additional_args,
            roots = ?settings.workspace_roots,
            "agent settings loaded"
        );

        settings
    }

    /// Sets the agent script path.
    pub fn with_script_path(mut self, path: impl Into<String>) -> Self {
        self.script_path = expand_path(&path.into());
        self
    }

    /// Sets the interpreter.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter_path = expand_path(&interpreter.into());
        self
    }

    /// Sets the extra script arguments.
    pub fn with_additional_args(mut self, args: Vec<String>) -> Self {
        self.additional_args = args;
        self
    }

    /// Sets the run timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a workspace root to the end of the search order.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_roots.push(root.into());
        self
    }

    /// Sets the install directory.
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Sets the request artifact directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }
}
