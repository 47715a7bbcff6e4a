pub use crate::application_spec::{Application, ApplicationSpec, ApplicationStatus};
pub use crate::artifacts::{ArtifactCollector, CollectionReport, ExportKind};
pub use crate::error::{Error, Result};
pub use crate::kube::{unique_name, KubeStore, TestKubeClient};
pub use crate::lifecycle::{Lifecycle, ManagedResource};
pub use crate::logs::{KubeLogExporter, LogExporter};
pub use crate::pipeline_run_spec::PipelineRun;
pub use crate::settings::{Poll, Settings};
pub use crate::store::ObjectStore;
pub use crate::temporary_resource::TemporaryResource;
pub use crate::wait::{wait_for, wait_until, WaitError};

pub use k8s_openapi::api::core::v1::Pod;
