use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use e2e_test_support::{
    error::{Error, Result},
    logs::LogExporter,
};

/// File which the fake exporter writes on a successful pod log export
pub const POD_LOG_FILE: &str = "pod-logs.log";

/// File which the fake exporter writes on a successful pipeline run export
pub const PIPELINE_RUN_LOG_FILE: &str = "pipelinerun-logs.log";

/// Log exporter which writes a marker file or fails as configured
#[derive(Default)]
pub struct FakeExporter {
    pub fail_pod_logs: bool,
    pub fail_pipeline_run_logs: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeExporter {
    pub fn succeeding() -> Self {
        FakeExporter::default()
    }

    pub fn failing() -> Self {
        FakeExporter {
            fail_pod_logs: true,
            fail_pipeline_run_logs: true,
            ..FakeExporter::default()
        }
    }

    pub fn failing_pod_logs() -> Self {
        FakeExporter {
            fail_pod_logs: true,
            ..FakeExporter::default()
        }
    }

    /// Returns the performed exports in the order of their invocation.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock is poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock is poisoned").push(call);
    }
}

#[async_trait]
impl LogExporter for FakeExporter {
    async fn export_pod_logs(
        &self,
        namespace: &str,
        job_name: &str,
        dest_dir: &Path,
    ) -> Result<()> {
        self.record(format!("pods {} {}", namespace, job_name));
        export(self.fail_pod_logs, "pod logs", dest_dir.join(POD_LOG_FILE)).await
    }

    async fn export_pipeline_run_logs(&self, namespace: &str, dest_dir: &Path) -> Result<()> {
        self.record(format!("pipelineruns {}", namespace));
        export(
            self.fail_pipeline_run_logs,
            "pipeline run logs",
            dest_dir.join(PIPELINE_RUN_LOG_FILE),
        )
        .await
    }
}

async fn export(fail: bool, what: &str, path: PathBuf) -> Result<()> {
    if fail {
        return Err(Error::Export {
            what: what.to_owned(),
            failed: vec![String::from("the server is currently unable to handle the request")],
        });
    }

    tokio::fs::write(&path, "line 1\nline 2\n")
        .await
        .map_err(|source| Error::WriteFile {
            path: path.clone(),
            source,
        })
}
