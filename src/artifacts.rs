//! Collection of test logs into the artifact directory
//!
//! Log collection is best-effort: a failed export is logged and recorded
//! in the [`CollectionReport`] but does not fail the collection. Only a
//! missing artifact directory is fatal.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    logs::LogExporter,
};

/// The exports which are performed by [`ArtifactCollector::collect`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportKind {
    PodLogs,
    PipelineRunLogs,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::PodLogs => write!(f, "pod logs"),
            ExportKind::PipelineRunLogs => write!(f, "pipeline run logs"),
        }
    }
}

/// A failed export
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionFailure {
    pub export: ExportKind,
    pub message: String,
}

/// Outcome of a collection
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionReport {
    /// Directory which contains the collected files
    pub directory: PathBuf,
    pub failures: Vec<CollectionFailure>,
}

impl CollectionReport {
    /// Returns true if all exports succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, export: ExportKind) -> bool {
        self.failures.iter().any(|failure| failure.export == export)
    }
}

/// Stores the logs of a test namespace below an artifact root
pub struct ArtifactCollector<E> {
    exporter: E,
    artifact_root: PathBuf,
}

impl<E: LogExporter> ArtifactCollector<E> {
    pub fn new(exporter: E, artifact_root: impl Into<PathBuf>) -> Self {
        ArtifactCollector {
            exporter,
            artifact_root: artifact_root.into(),
        }
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Returns the directory which receives the logs of the namespace.
    pub fn artifact_dir(&self, test_namespace: &str) -> PathBuf {
        self.artifact_root.join(test_namespace)
    }

    /// Creates the artifact directory of the test namespace and stores
    /// the pod logs and the pipeline run logs in it.
    ///
    /// The directory may already exist. An error is only returned if it
    /// cannot be created; failed exports are listed in the report.
    pub async fn collect(&self, test_namespace: &str, job_name: &str) -> Result<CollectionReport> {
        let directory = self.artifact_dir(test_namespace);

        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|source| Error::ArtifactDirectory {
                path: directory.clone(),
                source,
            })?;

        let mut failures = Vec::new();

        if let Err(error) = self
            .exporter
            .export_pod_logs(test_namespace, job_name, &directory)
            .await
        {
            failures.push(record_failure(test_namespace, ExportKind::PodLogs, &error));
        }

        if let Err(error) = self
            .exporter
            .export_pipeline_run_logs(test_namespace, &directory)
            .await
        {
            failures.push(record_failure(
                test_namespace,
                ExportKind::PipelineRunLogs,
                &error,
            ));
        }

        info!(
            namespace = test_namespace,
            directory = %directory.display(),
            failed_exports = failures.len(),
            "Test logs collected"
        );

        Ok(CollectionReport {
            directory,
            failures,
        })
    }
}

fn record_failure(namespace: &str, export: ExportKind, error: &Error) -> CollectionFailure {
    warn!(namespace, %export, %error, "Failed to store logs");
    CollectionFailure {
        export,
        message: error.to_string(),
    }
}
