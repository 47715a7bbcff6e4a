use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label which Tekton sets on the pods of a pipeline run
pub const PIPELINE_RUN_LABEL: &str = "tekton.dev/pipelineRun";

/// Specification of a Tekton pipeline run
///
/// Only the envelope is typed; the specification and the status are
/// kept as they are returned by the API server so that they can be
/// stored verbatim.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    kind = "PipelineRun",
    group = "tekton.dev",
    version = "v1beta1",
    namespaced,
    status = "PipelineRunStatus"
)]
pub struct PipelineRunSpec {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct PipelineRunStatus {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// Returns the label selector which matches the pods of the given
/// pipeline run.
pub fn pipeline_run_pod_selector(pipeline_run_name: &str) -> String {
    format!("{}={}", PIPELINE_RUN_LABEL, pipeline_run_name)
}

/// Returns the label selector which matches all pods which do not belong
/// to a pipeline run.
pub fn standalone_pod_selector() -> String {
    format!("!{}", PIPELINE_RUN_LABEL)
}
