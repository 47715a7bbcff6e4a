//! Clients for interacting with the Kubernetes API
//!
//! These clients simplify testing.

use std::{fmt::Debug, future::Future, time::Duration};

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::{Client, Resource};
use serde::{de::DeserializeOwned, Serialize};
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::{
    artifacts::{ArtifactCollector, CollectionReport},
    error::{Error, Result},
    lifecycle::{Lifecycle, ManagedResource},
    logs::KubeLogExporter,
    settings::Settings,
    store::ObjectStore,
};

/// Maximum length of a DNS label, e.g. of a namespace name
const MAX_NAME_LENGTH: usize = 63;

/// An [`ObjectStore`] backed by the Kubernetes API server
///
/// [`KubeStore`] wraps a [`Client`][kube::Client] and works on any
/// namespaced resource kind.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Creates a [`KubeStore`] from the default kubeconfig or the
    /// in-cluster configuration.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|source| Error::Initialization { source })?;
        Ok(KubeStore::new(client))
    }

    pub fn new(client: Client) -> Self {
        KubeStore { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore
where
    K: Resource<DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    async fn create(&self, namespace: &str, object: &K) -> Result<K, kube::Error> {
        self.api::<K>(namespace)
            .create(&PostParams::default(), object)
            .await
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K, kube::Error> {
        self.api::<K>(namespace).get(name).await
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        self.api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<K>, kube::Error> {
        Ok(self
            .api::<K>(namespace)
            .list(&ListParams::default())
            .await?
            .items)
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), kube::Error> {
        self.api::<K>(namespace)
            .delete_collection(&DeleteParams::default(), &ListParams::default())
            .await
            .map(|_| ())
    }
}

/// A client for interacting with the Kubernetes API
///
/// [`TestKubeClient`] is a synchronous facade over [`Lifecycle`] and
/// [`ArtifactCollector`]. Every call blocks the current thread until
/// the awaited state is reached or the timeout elapsed. It must not be
/// used from within an asynchronous context.
pub struct TestKubeClient {
    runtime: Runtime,
    store: KubeStore,
    settings: Settings,
}

impl TestKubeClient {
    /// Creates a [`TestKubeClient`] with settings taken from the
    /// environment.
    pub fn new() -> Result<TestKubeClient> {
        TestKubeClient::with_settings(Settings::from_env()?)
    }

    /// Creates a [`TestKubeClient`] with the given settings.
    pub fn with_settings(settings: Settings) -> Result<TestKubeClient> {
        let runtime = Runtime::new().map_err(|source| Error::Runtime { source })?;
        let store = runtime.block_on(KubeStore::try_default())?;
        Ok(TestKubeClient {
            runtime,
            store,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns an asynchronous lifecycle helper for the resource kind `K`.
    pub fn lifecycle<K: ManagedResource>(&self) -> Lifecycle<K, KubeStore> {
        Lifecycle::new(self.store.clone(), self.settings.clone())
    }

    /// Runs the given future to completion on the runtime of this client.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Returns the resource with the given name.
    pub fn get<K: ManagedResource>(&self, name: &str, namespace: &str) -> Result<K> {
        self.block_on(self.lifecycle::<K>().get(name, namespace))
    }

    /// Creates a resource and blocks until it is ready or the configured
    /// creation timeout elapsed.
    pub fn create<K: ManagedResource>(&self, name: &str, namespace: &str) -> Result<K> {
        self.block_on(self.lifecycle::<K>().create(name, namespace))
    }

    /// Creates a resource and blocks until it is ready or the given
    /// timeout elapsed.
    pub fn create_with_timeout<K: ManagedResource>(
        &self,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<K> {
        self.block_on(
            self.lifecycle::<K>()
                .create_with_timeout(name, namespace, timeout),
        )
    }

    /// Deletes a resource and blocks until it is gone.
    pub fn delete<K: ManagedResource>(
        &self,
        name: &str,
        namespace: &str,
        report_error_if_absent: bool,
    ) -> Result<()> {
        self.block_on(
            self.lifecycle::<K>()
                .delete(name, namespace, report_error_if_absent),
        )
    }

    /// Deletes all resources of kind `K` in the namespace and blocks
    /// until the namespace does not contain any of them anymore.
    pub fn delete_all_in_namespace<K: ManagedResource>(
        &self,
        namespace: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.block_on(
            self.lifecycle::<K>()
                .delete_all_in_namespace(namespace, timeout),
        )
    }

    /// Stores the pod and pipeline run logs of the test namespace in the
    /// artifact directory.
    ///
    /// See [`ArtifactCollector::collect`].
    pub fn collect_artifacts(
        &self,
        test_namespace: &str,
        job_name: &str,
    ) -> Result<CollectionReport> {
        let collector = ArtifactCollector::new(
            KubeLogExporter::new(self.store.client().clone()),
            self.settings.artifact_root.clone(),
        );
        self.block_on(collector.collect(test_namespace, job_name))
    }
}

/// Appends a UUID to the given prefix.
///
/// The prefix is shortened so that the result fits into a DNS label and
/// can also be used as a namespace name. The UUID is always kept.
pub fn unique_name(prefix: &str) -> String {
    let uuid = Uuid::new_v4().to_hyphenated().to_string();
    let max_prefix_length = MAX_NAME_LENGTH - uuid.len() - 1;

    let mut end = prefix.len().min(max_prefix_length);
    while !prefix.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = prefix[..end].trim_end_matches('-');

    if prefix.is_empty() {
        uuid
    } else {
        format!("{}-{}", prefix, uuid)
    }
}

/// Deserializes the given YAML text into the desired type.
pub fn from_yaml<T>(yaml: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_yaml::from_str(yaml).map_err(|source| Error::Serialization {
        what: String::from("YAML document"),
        source,
    })
}
