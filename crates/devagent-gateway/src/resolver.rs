//! Agent script and interpreter resolution.

use std::path::{Path, PathBuf};

use devagent_core::AgentSettings;
use tracing::{debug, trace};

/// Subdirectory of the install dir that ships the bundled agent scripts.
const SCRIPTS_SUBDIR: &str = "scripts";

/// Result of looking up the agent script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The script exists at this path.
    Found(PathBuf),
    /// No candidate exists; carries the path as configured.
    Missing(PathBuf),
}

impl Resolution {
    /// Returns the path carried by either variant.
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Found(p) | Resolution::Missing(p) => p,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Finds the agent script.
///
/// Search order for a relative path:
/// 1. each workspace root, in order
/// 2. `<install_dir>/scripts/<script>`
///
/// Absolute paths are checked as-is.
#[derive(Debug, Clone)]
pub struct ScriptResolver {
    workspace_roots: Vec<PathBuf>,
    install_dir: PathBuf,
}

impl ScriptResolver {
    /// Creates a new resolver.
    pub fn new(workspace_roots: Vec<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_roots,
            install_dir: install_dir.into(),
        }
    }

    /// Creates a resolver from agent settings.
    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self::new(settings.workspace_roots.clone(), settings.install_dir.clone())
    }

    /// Candidate locations for `script`, in search order.
    pub fn candidates(&self, script: &str) -> Vec<PathBuf> {
        let script_path = Path::new(script);
        if script_path.is_absolute() {
            return vec![script_path.to_path_buf()];
        }

        self.workspace_roots
            .iter()
            .map(|root| root.join(script_path))
            .chain(std::iter::once(
                self.install_dir.join(SCRIPTS_SUBDIR).join(script_path),
            ))
            .collect()
    }

    /// Resolve `script` to the first existing candidate.
    pub fn resolve(&self, script: &str) -> Resolution {
        for candidate in self.candidates(script) {
            trace!(candidate = %candidate.display(), "checking agent script candidate");
            if candidate.is_file() {
                debug!(script = %script, path = %candidate.display(), "agent script resolved");
                return Resolution::Found(candidate);
            }
        }

        debug!(script = %script, "agent script not found");
        Resolution::Missing(PathBuf::from(script))
    }
}

/// Resolve the interpreter to a full path.
///
/// Bare names are looked up on `PATH`; anything containing a separator, or
/// a name `PATH` does not know, is returned unchanged so that launching it
/// reports the real error.
pub fn resolve_interpreter(interpreter: &str) -> PathBuf {
    let path = Path::new(interpreter);
    if path.components().count() > 1 || path.is_absolute() {
        return path.to_path_buf();
    }

    match which::which(interpreter) {
        Ok(found) => {
            trace!(interpreter = %interpreter, path = %found.display(), "interpreter found");
            found
        }
        Err(e) => {
            debug!(interpreter = %interpreter, error = %e, "interpreter not on PATH");
            path.to_path_buf()
        }
    }
}
