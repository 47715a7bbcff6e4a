//! Create, wait for and delete namespaced custom resources
//!
//! [`Lifecycle`] performs the create/get/delete calls against an
//! [`ObjectStore`] and awaits the according status change within the
//! given timeouts. Timeouts are reported as [`Error::Timeout`] together
//! with the last known state of the object.

use std::{fmt::Debug, future::Future, time::Duration};

use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::{
    error::{is_not_found, Error, Result},
    settings::{Poll, Settings},
    store::ObjectStore,
    wait::{wait_for, wait_until, WaitError},
};

/// A namespaced resource kind which is considered ready once its
/// controller has populated a status field
pub trait ManagedResource:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Describes what is awaited after the creation, e.g. "devfile content"
    const READINESS: &'static str;

    /// Builds the object which is submitted on creation.
    fn desired(name: &str, namespace: &str) -> Self;

    /// Checks the readiness on the latest fetched state.
    fn is_ready(&self) -> bool;
}

/// Lifecycle helper for resources of kind `K` stored in `S`
pub struct Lifecycle<K, S> {
    store: S,
    settings: Settings,
    _kind: std::marker::PhantomData<fn() -> K>,
}

impl<K, S> Lifecycle<K, S>
where
    K: ManagedResource,
    S: ObjectStore<K>,
{
    pub fn new(store: S, settings: Settings) -> Self {
        Lifecycle {
            store,
            settings,
            _kind: std::marker::PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the object with the given name.
    pub async fn get(&self, name: &str, namespace: &str) -> Result<K> {
        self.store
            .get(namespace, name)
            .await
            .map_err(|source| submission_error::<K>("get", name, namespace, source))
    }

    /// Creates an object and waits for its readiness within the
    /// configured creation timeout.
    pub async fn create(&self, name: &str, namespace: &str) -> Result<K> {
        self.create_with_timeout(name, namespace, self.settings.create_timeout)
            .await
    }

    /// Creates an object and waits for its readiness within the given
    /// timeout.
    ///
    /// A rejected creation is returned as is and not retried. If the
    /// object is not ready in time then it is fetched once more and its
    /// state is added to the timeout error.
    pub async fn create_with_timeout(
        &self,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<K> {
        let desired = K::desired(name, namespace);

        let created = self
            .store
            .create(namespace, &desired)
            .await
            .map_err(|source| submission_error::<K>("create", name, namespace, source))?;
        let kind = K::kind(&());
        info!(%kind, name, namespace, "Resource created");

        let store = &self.store;
        let result = wait_for(self.settings.create_poll(timeout), move || async move {
            match store.get(namespace, name).await {
                Ok(object) if object.is_ready() => Ok(Some(object)),
                Ok(_) => Ok(None),
                Err(error) => {
                    debug!(name, namespace, %error, "Lookup failed; retrying");
                    Ok(None)
                }
            }
        })
        .await;

        match result {
            Ok(object) => Ok(object),
            Err(WaitError::Failed(error)) => Err(error),
            Err(WaitError::TimedOut) => {
                let last_known = self.refresh_for_diagnostics(name, namespace, created).await;
                Err(Error::Timeout {
                    what: format!(
                        "{} of {} [{}] in namespace [{}]",
                        K::READINESS,
                        kind,
                        name,
                        namespace
                    ),
                    timeout,
                    last_state: Some(to_pretty_json(&last_known)),
                })
            }
        }
    }

    /// Deletes an object and waits until the store no longer returns it.
    ///
    /// If the object does not exist then an error is returned only if
    /// `report_error_if_absent` is set. This allows cleaning up objects
    /// which were probably already deleted together with their
    /// namespace.
    pub async fn delete(
        &self,
        name: &str,
        namespace: &str,
        report_error_if_absent: bool,
    ) -> Result<()> {
        if let Err(source) = self.store.delete(namespace, name).await {
            if report_error_if_absent || !is_not_found(&source) {
                return Err(submission_error::<K>("delete", name, namespace, source));
            }
            debug!(name, namespace, "Resource already absent");
        }

        let poll = self.settings.delete_poll();
        self.await_condition(poll, self.deleted(name, namespace), || {
            format!(
                "deletion of {} [{}] in namespace [{}]",
                K::kind(&()),
                name,
                namespace
            )
        })
        .await?;

        let kind = K::kind(&());
        info!(%kind, name, namespace, "Resource deleted");
        Ok(())
    }

    /// Deletes all objects of this kind in the namespace and waits until
    /// the namespace is empty.
    pub async fn delete_all_in_namespace(&self, namespace: &str, timeout: Duration) -> Result<()> {
        self.store
            .delete_all(namespace)
            .await
            .map_err(|source| submission_error::<K>("delete all", "*", namespace, source))?;

        let store = &self.store;
        let poll = Poll::new(self.settings.poll_interval, timeout);
        self.await_condition(
            poll,
            move || async move {
                match store.list(namespace).await {
                    Ok(objects) => {
                        debug!(namespace, remaining = objects.len(), "Awaiting deletion");
                        Ok(objects.is_empty())
                    }
                    Err(_) => Ok(false),
                }
            },
            || format!("deletion of all {}s in namespace [{}]", K::kind(&()), namespace),
        )
        .await?;

        let kind = K::kind(&());
        info!(%kind, namespace, "All resources deleted");
        Ok(())
    }

    /// Condition which is met once the object is ready
    ///
    /// Failed lookups are treated as "not ready yet".
    pub fn ready<'a>(
        &'a self,
        name: &'a str,
        namespace: &'a str,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> + 'a
    {
        let store = &self.store;
        move || {
            Box::pin(async move {
                Ok(store
                    .get(namespace, name)
                    .await
                    .map(|object| object.is_ready())
                    .unwrap_or(false))
            })
        }
    }

    /// Condition which is met once a lookup of the object yields "not
    /// found"
    pub fn deleted<'a>(
        &'a self,
        name: &'a str,
        namespace: &'a str,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> + 'a
    {
        let store = &self.store;
        move || {
            Box::pin(async move {
                Ok(matches!(store.get(namespace, name).await, Err(error) if is_not_found(&error)))
            })
        }
    }

    async fn await_condition<F, Fut, D>(&self, poll: Poll, condition: F, what: D) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
        D: FnOnce() -> String,
    {
        wait_until(poll, condition).await.map_err(|error| match error {
            WaitError::Failed(error) => error,
            WaitError::TimedOut => Error::Timeout {
                what: what(),
                timeout: poll.timeout,
                last_state: None,
            },
        })
    }

    /// Returns the latest state from the store or the given object if
    /// it cannot be fetched.
    async fn refresh_for_diagnostics(&self, name: &str, namespace: &str, fallback: K) -> K {
        self.store.get(namespace, name).await.unwrap_or(fallback)
    }
}

fn submission_error<K: ManagedResource>(
    action: &'static str,
    name: &str,
    namespace: &str,
    source: kube::Error,
) -> Error {
    Error::Submission {
        action,
        kind: K::kind(&()).into_owned(),
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        source,
    }
}

fn to_pretty_json<T: Serialize + Debug>(object: &T) -> String {
    serde_json::to_string_pretty(object).unwrap_or_else(|_| format!("{:?}", object))
}
