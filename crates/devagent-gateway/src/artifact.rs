//! Request artifact: the JSON file handed to the agent process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use devagent_models::RequestDescriptor;
use tempfile::TempPath;
use tracing::{trace, warn};

use crate::error::{GatewayError, Result};

/// A request written to a uniquely named file.
///
/// The file is deleted exactly once, when the artifact is dropped. Names
/// combine a millisecond timestamp with a random suffix and are created
/// with exclusive-create semantics, so concurrent calls never collide.
#[derive(Debug)]
pub struct RequestArtifact {
    path: Option<TempPath>,
}

impl RequestArtifact {
    /// Write `descriptor` to a new file in `dir`, creating `dir` if needed.
    pub fn create(dir: &Path, descriptor: &RequestDescriptor) -> Result<Self> {
        let artifact_error = |source| GatewayError::Artifact {
            path: dir.to_path_buf(),
            source,
        };

        fs::create_dir_all(dir).map_err(artifact_error)?;

        let json = descriptor.to_json()?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("request_{}_", Utc::now().timestamp_millis()))
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(artifact_error)?;

        file.write_all(json.as_bytes()).map_err(artifact_error)?;
        file.flush().map_err(artifact_error)?;

        // Close our handle; the agent opens the file by path.
        let path = file.into_temp_path();
        trace!(path = %path.display(), "request artifact written");

        Ok(Self { path: Some(path) })
    }

    /// Location of the request file.
    pub fn path(&self) -> &Path {
        match &self.path {
            Some(p) => &**p,
            None => Path::new(""),
        }
    }

    /// Owned copy of the location, for handing to the process runner.
    pub fn to_path_buf(&self) -> PathBuf {
        self.path().to_path_buf()
    }
}

impl Drop for RequestArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let location = path.to_path_buf();
            match path.close() {
                Ok(()) => trace!(path = %location.display(), "request artifact removed"),
                Err(e) => warn!(
                    path = %location.display(),
                    error = %e,
                    "failed to delete request artifact"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devagent_models::CommandType;
    use tempfile::tempdir;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new("explain", CommandType::Explain, "x = 1", "a.py")
    }

    #[test]
    fn test_create_writes_json() {
        let dir = tempdir().unwrap();
        let artifact = RequestArtifact::create(dir.path(), &descriptor()).unwrap();

        let written = fs::read_to_string(artifact.path()).unwrap();
        let parsed: RequestDescriptor = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, descriptor());

        let name = artifact.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("request_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let artifact = RequestArtifact::create(dir.path(), &descriptor()).unwrap();
        let path = artifact.to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_create_makes_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("dev-agent/requests");

        let artifact = RequestArtifact::create(&nested, &descriptor()).unwrap();
        assert!(artifact.path().starts_with(&nested));
    }

    #[test]
    fn test_names_are_unique() {
        let dir = tempdir().unwrap();
        let artifacts: Vec<_> = (0..16)
            .map(|_| RequestArtifact::create(dir.path(), &descriptor()).unwrap())
            .collect();

        let mut paths: Vec<_> = artifacts.iter().map(|a| a.to_path_buf()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 16);
    }

    #[test]
    fn test_file_already_gone_does_not_panic() {
        let dir = tempdir().unwrap();
        let artifact = RequestArtifact::create(dir.path(), &descriptor()).unwrap();
        fs::remove_file(artifact.path()).unwrap();
        drop(artifact);
    }
}
