//! Helpers for end-to-end tests against the application platform
//!
//! The [`Lifecycle`][lifecycle::Lifecycle] helper creates, awaits and
//! deletes custom resources like [`Application`]s. The
//! [`ArtifactCollector`][artifacts::ArtifactCollector] stores pod and
//! pipeline run logs of a test namespace for later diagnosis.
//! [`TestKubeClient`] offers both as blocking calls.

pub mod application_spec;
pub mod artifacts;
pub mod error;
pub mod kube;
pub mod lifecycle;
pub mod logs;
pub mod pipeline_run_spec;
pub mod prelude;
pub mod settings;
pub mod store;
pub mod temporary_resource;
pub mod wait;

pub use crate::application_spec::Application;
pub use crate::error::{Error, Result};
pub use crate::kube::TestKubeClient;
