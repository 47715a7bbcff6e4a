//! Export of pod and pipeline run logs into a directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, LogParams};
use kube::{Client, ResourceExt};
use tracing::debug;

use crate::{
    error::{Error, Result},
    pipeline_run_spec::{pipeline_run_pod_selector, standalone_pod_selector, PipelineRun},
};

/// Exports logs of a test namespace into a directory
#[async_trait]
pub trait LogExporter: Send + Sync {
    /// Stores the logs of all pods in the namespace which do not belong
    /// to a pipeline run.
    ///
    /// The file names are prefixed with the job name.
    async fn export_pod_logs(&self, namespace: &str, job_name: &str, dest_dir: &Path)
        -> Result<()>;

    /// Stores all pipeline runs in the namespace together with the logs
    /// of their pods.
    async fn export_pipeline_run_logs(&self, namespace: &str, dest_dir: &Path) -> Result<()>;
}

/// A [`LogExporter`] which reads from the Kubernetes API server
#[derive(Clone)]
pub struct KubeLogExporter {
    client: Client,
}

impl KubeLogExporter {
    pub fn new(client: Client) -> Self {
        KubeLogExporter { client }
    }

    async fn list_pods(&self, namespace: &str, list_params: &ListParams) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.list(list_params)
            .await
            .map(|list| list.items)
            .map_err(|error| Error::Export {
                what: format!("pods in namespace [{}]", namespace),
                failed: vec![error.to_string()],
            })
    }

    /// Writes the log of every container of the given pods and returns
    /// a description of each failed container.
    async fn store_container_logs(
        &self,
        namespace: &str,
        pods: &[Pod],
        file_prefix: &str,
        dest_dir: &Path,
    ) -> Vec<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let api = &api;

        let exports = pods
            .iter()
            .flat_map(|pod| {
                let pod_name = pod.name();
                container_names(pod)
                    .into_iter()
                    .map(move |container| (pod_name.clone(), container))
            })
            .map(move |(pod_name, container)| async move {
                let params = LogParams {
                    container: Some(container.clone()),
                    ..LogParams::default()
                };
                let path = dest_dir.join(log_file_name(file_prefix, &pod_name, &container));

                let result = match api.logs(&pod_name, &params).await {
                    Ok(logs) => write_file(&path, logs.as_bytes()).await,
                    Err(error) => Err(Error::Export {
                        what: String::from("container log"),
                        failed: vec![error.to_string()],
                    }),
                };

                container_failure(&pod_name, &container, result)
            });

        join_all(exports).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl LogExporter for KubeLogExporter {
    async fn export_pod_logs(
        &self,
        namespace: &str,
        job_name: &str,
        dest_dir: &Path,
    ) -> Result<()> {
        let list_params = ListParams::default().labels(&standalone_pod_selector());
        let pods = self.list_pods(namespace, &list_params).await?;
        debug!(namespace, pods = pods.len(), "Exporting pod logs");

        let failed = self
            .store_container_logs(namespace, &pods, job_name, dest_dir)
            .await;

        export_outcome(format!("pod logs of namespace [{}]", namespace), failed)
    }

    async fn export_pipeline_run_logs(&self, namespace: &str, dest_dir: &Path) -> Result<()> {
        let api: Api<PipelineRun> = Api::namespaced(self.client.clone(), namespace);
        let pipeline_runs = api
            .list(&ListParams::default())
            .await
            .map_err(|error| Error::Export {
                what: format!("pipeline runs in namespace [{}]", namespace),
                failed: vec![error.to_string()],
            })?
            .items;
        debug!(
            namespace,
            pipeline_runs = pipeline_runs.len(),
            "Exporting pipeline runs"
        );

        let mut failed = Vec::new();

        for pipeline_run in &pipeline_runs {
            let name = pipeline_run.name();

            let dump = serde_yaml::to_string(pipeline_run).map_err(|source| {
                Error::Serialization {
                    what: format!("PipelineRun [{}]", name),
                    source,
                }
            });
            let stored = match dump {
                Ok(dump) => {
                    let path = pipeline_run_file_name(dest_dir, &name);
                    write_file(&path, dump.as_bytes()).await
                }
                Err(error) => Err(error),
            };
            if let Err(error) = stored {
                failed.push(error.to_string());
            }

            let list_params = ListParams::default().labels(&pipeline_run_pod_selector(&name));
            match self.list_pods(namespace, &list_params).await {
                Ok(pods) => failed.extend(
                    self.store_container_logs(namespace, &pods, &name, dest_dir)
                        .await,
                ),
                Err(error) => failed.push(error.to_string()),
            }
        }

        export_outcome(
            format!("pipeline run logs of namespace [{}]", namespace),
            failed,
        )
    }
}

/// Describes a failed container export as `pod/container: error`.
fn container_failure(pod_name: &str, container: &str, result: Result<()>) -> Option<String> {
    result
        .err()
        .map(|error| format!("{}/{}: {}", pod_name, container, error))
}

/// Fails with all collected failures if there are any.
fn export_outcome(what: String, failed: Vec<String>) -> Result<()> {
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::Export { what, failed })
    }
}

/// Returns the names of all containers declared in the pod.
fn container_names(pod: &Pod) -> Vec<String> {
    pod.spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .map(|container| container.name.to_owned())
                .collect()
        })
        .unwrap_or_else(Vec::new)
}

/// Returns the file name for the log of a container, e.g.
/// `job-pod-container.log`.
///
/// The prefix is omitted if it is empty.
pub fn log_file_name(prefix: &str, pod_name: &str, container: &str) -> String {
    if prefix.is_empty() {
        format!("{}-{}.log", pod_name, container)
    } else {
        format!("{}-{}-{}.log", prefix, pod_name, container)
    }
}

fn pipeline_run_file_name(dest_dir: &Path, name: &str) -> PathBuf {
    dest_dir.join(format!("pipelinerun-{}.yaml", name))
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| Error::WriteFile {
            path: path.to_owned(),
            source,
        })
}
