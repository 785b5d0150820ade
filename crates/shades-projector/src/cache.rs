//! Projection cache: `namespace -> projection name -> instance`
//!
//! Readers (the query layer) get cheap clones of [`ProjectionHandle`]s. Only
//! the ingestor and the reload coordinator in this crate can write.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shades_core::{Namespace, Projection, ProjectionKey, ProjectionName};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Projections of one namespace, ordered by projection name
pub type NamespaceProjections = BTreeMap<ProjectionName, ProjectionHandle>;

/// Shared reference to one live projection instance.
///
/// Clones point at the same instance; a reload swaps the cache slot to a new
/// handle rather than mutating this one.
#[derive(Clone)]
pub struct ProjectionHandle {
    inner: Arc<RwLock<Box<dyn Projection>>>,
}

impl ProjectionHandle {
    pub fn new(projection: Box<dyn Projection>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(projection)),
        }
    }

    /// Read access to the instance. Don't hold the guard across `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Projection>> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Projection>> {
        self.inner.write()
    }

    /// Run `f` against the concrete projection type, `None` on type mismatch
    pub fn read_as<P, T>(&self, f: impl FnOnce(&P) -> T) -> Option<T>
    where
        P: Projection,
    {
        let guard = self.inner.read();
        guard.as_any().downcast_ref::<P>().map(f)
    }

    /// True if both handles point at the same instance
    pub fn same_instance(&self, other: &ProjectionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ProjectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionHandle")
            .field("instance", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

#[derive(Default)]
pub struct ProjectionCache {
    namespaces: RwLock<HashMap<Namespace, NamespaceProjections>>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: &str, projection_name: &str) -> Option<ProjectionHandle> {
        self.namespaces
            .read()
            .get(namespace)
            .and_then(|projections| projections.get(projection_name))
            .cloned()
    }

    pub fn get_key(&self, key: &ProjectionKey) -> Option<ProjectionHandle> {
        self.get(&key.namespace, &key.projection_name)
    }

    pub fn contains(&self, namespace: &str, projection_name: &str) -> bool {
        self.get(namespace, projection_name).is_some()
    }

    /// Point-in-time copy of one namespace's slots
    pub fn namespace(&self, namespace: &str) -> Option<NamespaceProjections> {
        self.namespaces.read().get(namespace).cloned()
    }

    /// The projection the entity/relationship routes read from: the first by
    /// name in the namespace.
    pub fn first_projection(&self, namespace: &str) -> Option<ProjectionHandle> {
        self.namespaces
            .read()
            .get(namespace)
            .and_then(|projections| projections.values().next())
            .cloned()
    }

    /// Sorted namespace names
    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut names: Vec<_> = self.namespaces.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of live instances
    pub fn len(&self) -> usize {
        self.namespaces.read().values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Install a fresh instance at `key`, creating the namespace if needed
    pub(crate) fn install(
        &self,
        key: &ProjectionKey,
        projection: Box<dyn Projection>,
    ) -> ProjectionHandle {
        let handle = ProjectionHandle::new(projection);
        self.namespaces
            .write()
            .entry(key.namespace.clone())
            .or_default()
            .insert(key.projection_name.clone(), handle.clone());
        handle
    }

    /// Replace every slot of `namespace` at once
    pub(crate) fn replace_namespace(&self, namespace: Namespace, projections: NamespaceProjections) {
        self.namespaces.write().insert(namespace, projections);
    }
}
