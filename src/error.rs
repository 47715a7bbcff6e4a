use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Kubernetes client could not be created: {source}")]
    Initialization { source: kube::Error },

    #[error("Tokio runtime could not be created: {source}")]
    Runtime { source: io::Error },

    #[error("Unable to {action} {kind} [{name}] in namespace [{namespace}]: {source}")]
    Submission {
        action: &'static str,
        kind: String,
        name: String,
        namespace: String,
        source: kube::Error,
    },

    #[error(
        "Timed out after {timeout:?} waiting for {what}{}",
        .last_state.as_ref().map(|state| format!("; last known state: {}", state)).unwrap_or_default()
    )]
    Timeout {
        what: String,
        timeout: Duration,
        last_state: Option<String>,
    },

    #[error("Artifact directory [{}] could not be created: {source}", .path.display())]
    ArtifactDirectory { path: PathBuf, source: io::Error },

    #[error("Working directory could not be determined: {source}")]
    WorkingDirectory { source: io::Error },

    #[error("File [{}] could not be written: {source}", .path.display())]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("{what} could not be serialized: {source}")]
    Serialization {
        what: String,
        source: serde_yaml::Error,
    },

    #[error("Settings are invalid: {source}")]
    Settings { source: serde_yaml::Error },

    #[error("Settings are invalid: {key} must be a number of milliseconds but is [{value}]")]
    SettingsVariable { key: &'static str, value: String },

    #[error("Unable to export {what}: {}", .failed.join("; "))]
    Export { what: String, failed: Vec<String> },
}

impl Error {
    /// Returns true if a poll loop ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if the store reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Submission { source, .. } => is_not_found(source),
            _ => false,
        }
    }
}

/// Checks if the Kubernetes API responded with `404 Not Found`.
pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}
