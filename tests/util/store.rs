//! In-memory object store
//!
//! [`FakeStore`] simulates the behavior of the API server which the
//! lifecycle helpers rely on: a controller which populates the status
//! some reads after the creation, deletions which become visible only
//! after some reads, and transient lookup failures.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use e2e_test_support::{lifecycle::ManagedResource, store::ObjectStore};
use kube::{error::ErrorResponse, ResourceExt};

type Key = (String, String);
type Reconciler<K> = Arc<dyn Fn(&mut K) + Send + Sync>;

struct Entry<K> {
    object: K,
    reads: usize,
    /// Number of reads after which a requested deletion is complete
    reads_until_gone: Option<usize>,
}

struct State<K> {
    objects: BTreeMap<Key, Entry<K>>,
    failing_lookups: usize,
    creations: usize,
}

/// Object store which keeps the objects in memory
pub struct FakeStore<K> {
    state: Mutex<State<K>>,
    reconciler: Option<(usize, Reconciler<K>)>,
    deletion_lag: usize,
}

impl<K: ManagedResource> FakeStore<K> {
    /// Creates a store in which deletions complete immediately and no
    /// controller reconciles the objects.
    pub fn new() -> Self {
        FakeStore {
            state: Mutex::new(State {
                objects: BTreeMap::new(),
                failing_lookups: 0,
                creations: 0,
            }),
            reconciler: None,
            deletion_lag: 0,
        }
    }

    /// Applies `reconcile` to an object once it was read `reads` times.
    pub fn reconciled_after<F>(mut self, reads: usize, reconcile: F) -> Self
    where
        F: Fn(&mut K) + Send + Sync + 'static,
    {
        self.reconciler = Some((reads, Arc::new(reconcile)));
        self
    }

    /// Keeps deleted objects visible for the given number of reads.
    ///
    /// Bulk deletions add the position of the object in the namespace so
    /// that the objects disappear one after another.
    pub fn with_deletion_lag(mut self, reads: usize) -> Self {
        self.deletion_lag = reads;
        self
    }

    /// Lets the next `count` lookups fail with an internal server error.
    pub fn with_failing_lookups(self, count: usize) -> Self {
        self.lock().failing_lookups = count;
        self
    }

    /// Stores the object without going through `create`.
    pub fn insert(&self, object: K) {
        let key = key_of(&object);
        self.lock().objects.insert(
            key,
            Entry {
                object,
                reads: 0,
                reads_until_gone: None,
            },
        );
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.lock()
            .objects
            .contains_key(&(namespace.to_owned(), name.to_owned()))
    }

    pub fn count(&self, namespace: &str) -> usize {
        self.lock()
            .objects
            .keys()
            .filter(|(object_namespace, _)| object_namespace == namespace)
            .count()
    }

    pub fn creations(&self) -> usize {
        self.lock().creations
    }

    fn lock(&self) -> MutexGuard<'_, State<K>> {
        self.state.lock().expect("store lock is poisoned")
    }
}

#[async_trait]
impl<K: ManagedResource> ObjectStore<K> for FakeStore<K> {
    async fn create(&self, namespace: &str, object: &K) -> Result<K, kube::Error> {
        let mut state = self.lock();
        let key = (namespace.to_owned(), object.name());

        if state.objects.contains_key(&key) {
            return Err(api_error(409, "AlreadyExists"));
        }

        state.creations += 1;
        state.objects.insert(
            key,
            Entry {
                object: object.clone(),
                reads: 0,
                reads_until_gone: None,
            },
        );
        Ok(object.clone())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K, kube::Error> {
        let mut state = self.lock();

        if state.failing_lookups > 0 {
            state.failing_lookups -= 1;
            return Err(api_error(500, "InternalError"));
        }

        let key = (namespace.to_owned(), name.to_owned());
        if advance_deletion(&mut state.objects, &key) {
            return Err(api_error(404, "NotFound"));
        }

        let entry = state
            .objects
            .get_mut(&key)
            .ok_or_else(|| api_error(404, "NotFound"))?;
        entry.reads += 1;
        if let Some((reads, reconcile)) = &self.reconciler {
            if entry.reads > *reads {
                reconcile(&mut entry.object);
            }
        }
        Ok(entry.object.clone())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        let mut state = self.lock();
        let key = (namespace.to_owned(), name.to_owned());

        match state.objects.get_mut(&key) {
            Some(entry) if entry.reads_until_gone.is_none() => {
                entry.reads_until_gone = Some(self.deletion_lag);
            }
            Some(_) => {}
            None => return Err(api_error(404, "NotFound")),
        }
        advance_deletion_by(&mut state.objects, &key, 0);
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<K>, kube::Error> {
        let mut state = self.lock();

        let keys: Vec<Key> = keys_in(&state.objects, namespace);
        for key in &keys {
            advance_deletion(&mut state.objects, key);
        }

        Ok(keys_in(&state.objects, namespace)
            .iter()
            .filter_map(|key| state.objects.get(key))
            .map(|entry| entry.object.clone())
            .collect())
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), kube::Error> {
        let mut state = self.lock();

        for (position, key) in keys_in(&state.objects, namespace).iter().enumerate() {
            if let Some(entry) = state.objects.get_mut(key) {
                entry
                    .reads_until_gone
                    .get_or_insert(self.deletion_lag + position);
            }
        }
        Ok(())
    }
}

fn key_of<K: ManagedResource>(object: &K) -> Key {
    (object.namespace().unwrap_or_default(), object.name())
}

fn keys_in<K>(objects: &BTreeMap<Key, Entry<K>>, namespace: &str) -> Vec<Key> {
    objects
        .keys()
        .filter(|(object_namespace, _)| object_namespace == namespace)
        .cloned()
        .collect()
}

/// Counts a read of a deleted object and removes the object once its
/// deletion lag is used up. Returns true if the object is gone.
fn advance_deletion<K>(objects: &mut BTreeMap<Key, Entry<K>>, key: &Key) -> bool {
    advance_deletion_by(objects, key, 1)
}

fn advance_deletion_by<K>(objects: &mut BTreeMap<Key, Entry<K>>, key: &Key, reads: usize) -> bool {
    let remaining = match objects.get_mut(key).and_then(|entry| entry.reads_until_gone.as_mut()) {
        Some(remaining) => {
            *remaining = remaining.saturating_sub(reads);
            *remaining
        }
        None => return false,
    };

    if remaining == 0 {
        objects.remove(key);
        true
    } else {
        false
    }
}

/// Builds the error which the API server returns for the given status code.
pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: String::from("Failure"),
        message: format!("{} ({})", reason, code),
        reason: String::from(reason),
        code,
    })
}
