//! Bulk reload of the cache from the store.

use crate::cache::{NamespaceProjections, ProjectionHandle};
use crate::projector::Projector;
use shades_core::{observe, Namespace, Result};
use std::time::Instant;

impl Projector {
    /// Rebuild every namespace the store returns.
    ///
    /// Each returned namespace has its whole sub-map replaced by fresh
    /// instances, so projections the store no longer lists for it are
    /// dropped. Namespaces missing from the result are left alone. Nothing is
    /// installed unless the fetch and every factory call succeed.
    pub async fn reload_projections(&self) -> Result<()> {
        let start = Instant::now();
        let _gate = self.reload_gate.write().await;
        observe::record_lock_wait(start.elapsed());

        let result = self.rebuild().await;
        observe::record_reload(
            start.elapsed(),
            *result.as_ref().unwrap_or(&0),
            result.is_ok(),
        );
        self.stats.record_reload(result.is_ok());

        match result {
            Ok(namespaces) => {
                tracing::info!(
                    namespaces,
                    projections = self.cache.len(),
                    elapsed = ?start.elapsed(),
                    "Reloaded projections from store"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Projection reload failed, cache left unchanged");
                Err(e)
            }
        }
    }

    /// Fetch and build everything first, then install. Returns the number of
    /// namespaces replaced.
    async fn rebuild(&self) -> Result<usize> {
        let snapshots = self.store.all().await?;

        let mut rebuilt: Vec<(Namespace, NamespaceProjections)> =
            Vec::with_capacity(snapshots.len());
        for (namespace, projections) in snapshots {
            let mut instances = NamespaceProjections::new();
            for (name, snapshot) in projections {
                let projection = self.registry.create(&name, Some(snapshot))?;
                instances.insert(name, ProjectionHandle::new(projection));
            }
            rebuilt.push((namespace, instances));
        }

        let count = rebuilt.len();
        for (namespace, instances) in rebuilt {
            tracing::debug!(namespace = %namespace, projections = instances.len(), "Replacing namespace");
            self.cache.replace_namespace(namespace, instances);
        }
        Ok(count)
    }
}
