use crate::error::Result;
use crate::types::{ConnectionEvent, Snapshot, SnapshotSet};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Durable store holding the authoritative projection snapshots.
///
/// Connection management belongs to the implementation: it reconnects on its
/// own and re-emits `ConnectionEvent::Connected` when it does.
#[async_trait]
pub trait Store: Send + Sync {
    /// Receiver for connect/error notifications
    fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Current snapshot for one projection, `None` if the store has none yet
    async fn get(&self, namespace: &str, projection_name: &str) -> Result<Option<Snapshot>>;

    /// Every snapshot, grouped by namespace then projection name
    async fn all(&self) -> Result<SnapshotSet>;
}
