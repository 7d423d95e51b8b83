//! The file attached to a conversation.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The single file currently associated with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    /// Path as reported by the collaborator that picked the file.
    pub path: String,
    /// Full text content of the file.
    pub content: String,
}

impl FileContext {
    /// Creates a new file context.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Returns the last path component, or the whole path if it has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}
