use crate::cache::ProjectionCache;
use crate::stats::{SyncStats, SyncStatsSnapshot};
use shades_core::{KeyLockManager, ProjectionRegistry, ServiceConfig, Store};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Projector: keeps the projection cache in sync with the store and the
/// broker's change stream.
///
/// Writers are ordered by two locks:
/// - the *reload gate*: every ingestion holds it shared for its whole call, a
///   reload holds it exclusively from before the bulk fetch until the new
///   instances are installed. Tokio's `RwLock` is fair, so a change accepted
///   after a reload started waits for it and lands on the rebuilt instance.
/// - the per-key lock: ingestions of the same `(namespace, projection)` run
///   one at a time, recovery fetch included. Ingestions of other keys never
///   wait on it, and no ingestion gives up waiting.
pub struct Projector {
    pub(crate) registry: ProjectionRegistry,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) cache: Arc<ProjectionCache>,
    pub(crate) locks: KeyLockManager,
    pub(crate) reload_gate: RwLock<()>,
    pub(crate) stats: SyncStats,
}

impl Projector {
    pub fn new(registry: ProjectionRegistry, store: Arc<dyn Store>, config: &ServiceConfig) -> Self {
        Self {
            registry,
            store,
            cache: Arc::new(ProjectionCache::new()),
            locks: KeyLockManager::with_stripes(config.lock_stripes),
            reload_gate: RwLock::new(()),
            stats: SyncStats::default(),
        }
    }

    /// The live cache, shared with readers
    pub fn cache(&self) -> &Arc<ProjectionCache> {
        &self.cache
    }

    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }
}
