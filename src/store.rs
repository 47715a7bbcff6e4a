//! Access to namespaced objects of one kind
//!
//! [`ObjectStore`] is implemented by [`KubeStore`][crate::kube::KubeStore]
//! for the Kubernetes API server. Tests can provide an in-memory
//! implementation instead.

use async_trait::async_trait;

/// Create, read and delete operations on namespaced objects of kind `K`
///
/// Errors are reported as [`kube::Error`]; a missing object must be
/// reported as an API error with code 404 so that it can be told apart
/// from other failures, see [`is_not_found`][crate::error::is_not_found].
#[async_trait]
pub trait ObjectStore<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    /// Submits a new object and returns the object as stored.
    async fn create(&self, namespace: &str, object: &K) -> Result<K, kube::Error>;

    /// Looks up the object with the given name.
    async fn get(&self, namespace: &str, name: &str) -> Result<K, kube::Error>;

    /// Requests the deletion of the object with the given name.
    ///
    /// The object may still be returned by subsequent lookups until the
    /// deletion is complete.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error>;

    /// Lists all objects in the namespace.
    async fn list(&self, namespace: &str) -> Result<Vec<K>, kube::Error>;

    /// Requests the deletion of all objects in the namespace.
    async fn delete_all(&self, namespace: &str) -> Result<(), kube::Error>;
}
