use std::ops::Deref;

use tracing::warn;

use crate::{error::Result, kube::TestKubeClient, lifecycle::ManagedResource};

/// A temporary resource which is deleted when it goes out of scope
///
/// The deletion does not report an already deleted resource, e.g. if
/// the namespace was removed first. Other failures are logged.
pub struct TemporaryResource<'a, K: ManagedResource> {
    client: &'a TestKubeClient,
    name: String,
    namespace: String,
    resource: K,
}

impl<'a, K: ManagedResource> TemporaryResource<'a, K> {
    /// Creates a new temporary resource and waits until it is ready.
    pub fn new(client: &'a TestKubeClient, name: &str, namespace: &str) -> Result<Self> {
        let resource = client.create(name, namespace)?;
        Ok(TemporaryResource {
            client,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            resource,
        })
    }

    /// Fetches the latest state of the resource.
    pub fn update(&mut self) -> Result<()> {
        self.resource = self.client.get(&self.name, &self.namespace)?;
        Ok(())
    }
}

impl<'a, K: ManagedResource> Drop for TemporaryResource<'a, K> {
    fn drop(&mut self) {
        if let Err(error) = self
            .client
            .delete::<K>(&self.name, &self.namespace, false)
        {
            warn!(
                name = %self.name,
                namespace = %self.namespace,
                %error,
                "Temporary resource could not be deleted"
            );
        }
    }
}

impl<'a, K: ManagedResource> Deref for TemporaryResource<'a, K> {
    type Target = K;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
