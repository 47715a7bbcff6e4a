use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::lifecycle::ManagedResource;

/// Specification of an application on the platform
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "Application",
    group = "appstudio.redhat.com",
    version = "v1alpha1",
    namespaced,
    status = "ApplicationStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_model_repository: Option<ApplicationGitRepository>,
    #[serde(
        default,
        rename = "gitOpsRepository",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_ops_repository: Option<ApplicationGitRepository>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, Eq, PartialEq, JsonSchema)]
pub struct ApplicationGitRepository {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Observed state of an application which is written by the
/// application controller
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// The devfile model of the application; empty until the
    /// controller has reconciled the application
    #[serde(default)]
    pub devfile: String,
    #[serde(default)]
    pub conditions: Vec<ApplicationCondition>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ManagedResource for Application {
    const READINESS: &'static str = "devfile content";

    fn desired(name: &str, namespace: &str) -> Self {
        let mut application = Application::new(
            name,
            ApplicationSpec {
                display_name: name.to_owned(),
                ..ApplicationSpec::default()
            },
        );
        application.metadata.namespace = Some(namespace.to_owned());
        application
    }

    fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .map(|status| !status.devfile.is_empty())
            .unwrap_or(false)
    }
}
