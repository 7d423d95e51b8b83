//! Dev agent CLI library.
//!
//! This crate provides the command-line interface and interactive REPL
//! for the dev agent.

pub mod cli;
pub mod commands;
pub mod repl;

use std::path::Path;

/// Validate that a workspace root exists and is a readable directory.
///
/// Returns `Ok(())` if the path is valid, or `Err(message)` describing the issue.
pub fn validate_workspace_root(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Workspace root does not exist: {}", path.display()));
    }

    if !path.is_dir() {
        return Err(format!(
            "Workspace root is not a directory: {}",
            path.display()
        ));
    }

    if path.read_dir().is_err() {
        return Err(format!(
            "Cannot access workspace root: {} (permission denied)",
            path.display()
        ));
    }

    Ok(())
}
