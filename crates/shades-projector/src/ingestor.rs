//! Change ingestion: one change message, one cache slot.

use crate::cache::ProjectionHandle;
use crate::projector::Projector;
use shades_core::{observe, ChangeMessage, Delta, ProjectionKey, Result};
use std::time::Instant;

impl Projector {
    /// Apply one change message to the cache.
    ///
    /// If the slot holds an instance and the message carries a delta, the
    /// delta is applied in place and the same instance is returned.
    /// Otherwise the slot is (re)loaded from the store and replaced with a
    /// freshly built instance; the message's delta, if any, only triggers the
    /// load and is not applied.
    ///
    /// Errors propagate to the caller. A failed `apply_delta` leaves the
    /// instance as the projection left it; a failed recovery load leaves the
    /// slot untouched.
    pub async fn on_data_changed(&self, message: ChangeMessage) -> Result<ProjectionHandle> {
        let result = self.ingest(message).await;
        if result.is_err() {
            self.stats.record_ingest_failure();
            observe::record_ingest_failure();
        }
        result
    }

    async fn ingest(&self, message: ChangeMessage) -> Result<ProjectionHandle> {
        let key = message.key();

        let wait = Instant::now();
        let _gate = self.reload_gate.read().await;
        let _guard = self.locks.lock(&key).await;
        observe::record_lock_wait(wait.elapsed());

        match (self.cache.get_key(&key), message.delta) {
            (Some(handle), Some(delta)) => self.apply_in_place(&key, handle, &delta),
            (_, delta) => {
                if delta.is_none() {
                    tracing::debug!(key = %key, "Refresh requested, reloading projection");
                }
                self.recover(&key).await
            }
        }
    }

    fn apply_in_place(
        &self,
        key: &ProjectionKey,
        handle: ProjectionHandle,
        delta: &Delta,
    ) -> Result<ProjectionHandle> {
        handle.write().apply_delta(delta)?;

        self.stats.record_delta();
        observe::record_delta_applied(&key.projection_name);
        tracing::debug!(key = %key, "Applied delta");
        Ok(handle)
    }

    /// Fetch the slot's snapshot and install a new instance built from it
    async fn recover(&self, key: &ProjectionKey) -> Result<ProjectionHandle> {
        let start = Instant::now();
        let factory = self.registry.factory(&key.projection_name)?;

        let loaded = self
            .store
            .get(&key.namespace, &key.projection_name)
            .await
            .and_then(|snapshot| factory.create(snapshot));
        observe::record_recovery_load(start.elapsed(), loaded.is_ok());

        let projection = match loaded {
            Ok(projection) => projection,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Recovery load failed");
                return Err(e);
            }
        };

        let handle = self.cache.install(key, projection);
        self.stats.record_recovery();
        tracing::debug!(key = %key, elapsed = ?start.elapsed(), "Recovered projection from store");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{graph_registry, Graph};
    use crate::Projector;
    use serde_json::json;
    use shades_core::{ChangeMessage, ProjectionKey, ServiceConfig, ShadesError};
    use shades_memory::MemoryStore;
    use std::sync::Arc;

    fn projector(store: Arc<MemoryStore>) -> Projector {
        Projector::new(graph_registry(), store, &ServiceConfig::default())
    }

    #[tokio::test]
    async fn test_refresh_on_empty_cache_fetches_once() {
        let store = Arc::new(MemoryStore::new());
        store.put("acme", "graph", json!(["e0"]));
        let projector = projector(store.clone());

        let handle = projector
            .on_data_changed(ChangeMessage::refresh("acme", "graph"))
            .await
            .unwrap();

        assert_eq!(store.get_calls(), vec![ProjectionKey::new("acme", "graph")]);
        let cached = projector.cache().get("acme", "graph").unwrap();
        assert!(cached.same_instance(&handle));
        assert_eq!(
            handle.read_as(|g: &Graph| g.state.clone()),
            Some(vec![json!("e0")])
        );
    }

    #[tokio::test]
    async fn test_delta_on_cached_instance_keeps_identity() {
        let store = Arc::new(MemoryStore::new());
        let projector = projector(store.clone());

        let first = projector
            .on_data_changed(ChangeMessage::refresh("acme", "graph"))
            .await
            .unwrap();
        let second = projector
            .on_data_changed(ChangeMessage::delta("acme", "graph", json!({"id": "e1"})))
            .await
            .unwrap();

        assert!(first.same_instance(&second));
        assert_eq!(store.get_calls().len(), 1);
        assert_eq!(
            second.read_as(|g: &Graph| g.state.clone()),
            Some(vec![json!({"id": "e1"})])
        );
        assert_eq!(projector.stats().deltas_applied, 1);
    }

    #[tokio::test]
    async fn test_first_delta_only_triggers_recovery() {
        let store = Arc::new(MemoryStore::new());
        store.put("acme", "graph", json!([]));
        let projector = projector(store.clone());

        let handle = projector
            .on_data_changed(ChangeMessage::delta(
                "acme",
                "graph",
                json!({"op": "add", "id": "e1"}),
            ))
            .await
            .unwrap();

        assert_eq!(store.get_calls(), vec![ProjectionKey::new("acme", "graph")]);
        assert_eq!(handle.read_as(|g: &Graph| g.state.len()), Some(0));
    }

    #[tokio::test]
    async fn test_refresh_replaces_cached_instance() {
        let store = Arc::new(MemoryStore::new());
        let projector = projector(store.clone());

        let first = projector
            .on_data_changed(ChangeMessage::refresh("acme", "graph"))
            .await
            .unwrap();
        store.put("acme", "graph", json!(["fresh"]));
        let second = projector
            .on_data_changed(ChangeMessage::refresh("acme", "graph"))
            .await
            .unwrap();

        assert!(!first.same_instance(&second));
        assert!(projector
            .cache()
            .get("acme", "graph")
            .unwrap()
            .same_instance(&second));
        assert_eq!(store.get_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_unchanged() {
        let store = Arc::new(MemoryStore::new());
        store.fail_fetches(true);
        let projector = projector(store.clone());

        let result = projector
            .on_data_changed(ChangeMessage::refresh("acme", "graph"))
            .await;

        assert!(matches!(result, Err(ShadesError::Store(_))));
        assert!(projector.cache().is_empty());
        assert_eq!(projector.stats().failed_ingestions, 1);
    }

    #[tokio::test]
    async fn test_apply_error_propagates_without_rollback() {
        let store = Arc::new(MemoryStore::new());
        let projector = projector(store.clone());

        let handle = projector
            .on_data_changed(ChangeMessage::delta("acme", "graph", json!("a")))
            .await
            .unwrap();
        projector
            .on_data_changed(ChangeMessage::delta("acme", "graph", json!("b")))
            .await
            .unwrap();

        // Graph records a poison delta, then rejects it
        let result = projector
            .on_data_changed(ChangeMessage::delta("acme", "graph", json!({"poison": true})))
            .await;

        assert!(matches!(result, Err(ShadesError::Projection(_))));
        let cached = projector.cache().get("acme", "graph").unwrap();
        assert!(cached.same_instance(&handle));
        assert_eq!(cached.read_as(|g: &Graph| g.state.len()), Some(2));
    }

    #[tokio::test]
    async fn test_unknown_projection_skips_fetch() {
        let store = Arc::new(MemoryStore::new());
        let projector = projector(store.clone());

        let result = projector
            .on_data_changed(ChangeMessage::refresh("acme", "nope"))
            .await;

        assert!(matches!(result, Err(ShadesError::UnknownProjection(_))));
        assert!(store.get_calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_first_deltas_recover_once() {
        let store = Arc::new(MemoryStore::new());
        let projector = Arc::new(projector(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let projector = projector.clone();
                tokio::spawn(async move {
                    projector
                        .on_data_changed(ChangeMessage::delta("acme", "graph", json!(i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        // One message recovered the slot, the other seven patched that instance
        assert_eq!(store.get_calls().len(), 1);
        assert!(results.windows(2).all(|w| w[0].same_instance(&w[1])));
        assert_eq!(results[0].read_as(|g: &Graph| g.state.len()), Some(7));
    }
}
