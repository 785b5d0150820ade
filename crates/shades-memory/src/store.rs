use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shades_core::{
    ConnectionEvent, ProjectionKey, Result, ShadesError, Snapshot, SnapshotSet, Store,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

/// Snapshot store held in memory.
///
/// Besides the [`Store`] contract it records every fetch and can fail or
/// hold fetches on demand, so callers can observe and stage the sync core's
/// interactions with its store.
pub struct MemoryStore {
    snapshots: RwLock<SnapshotSet>,
    events: broadcast::Sender<ConnectionEvent>,
    get_calls: Mutex<Vec<ProjectionKey>>,
    all_calls: AtomicUsize,
    failing: AtomicBool,
    held: watch::Sender<bool>,
    fetches_started: watch::Sender<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_snapshots(SnapshotSet::new())
    }

    pub fn with_snapshots(snapshots: SnapshotSet) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            snapshots: RwLock::new(snapshots),
            events,
            get_calls: Mutex::new(Vec::new()),
            all_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            held: watch::Sender::new(false),
            fetches_started: watch::Sender::new(0),
        }
    }

    /// Store (or overwrite) one snapshot
    pub fn put(&self, namespace: &str, projection_name: &str, snapshot: Snapshot) {
        self.snapshots
            .write()
            .entry(namespace.to_string())
            .or_default()
            .insert(projection_name.to_string(), snapshot);
    }

    pub fn remove_namespace(&self, namespace: &str) -> bool {
        self.snapshots.write().remove(namespace).is_some()
    }

    pub fn clear(&self) {
        self.snapshots.write().clear();
    }

    /// Emit a connect notification
    pub fn connect(&self) {
        // No receivers yet is fine
        let _ = self.events.send(ConnectionEvent::Connected);
    }

    /// Emit an error notification
    pub fn disconnect(&self) {
        let _ = self.events.send(ConnectionEvent::Error);
    }

    /// Make every subsequent fetch fail (or succeed again)
    pub fn fail_fetches(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Park fetches until [`release_fetches`](Self::release_fetches)
    pub fn hold_fetches(&self) {
        self.held.send_replace(true);
    }

    pub fn release_fetches(&self) {
        self.held.send_replace(false);
    }

    /// Wait until at least `count` fetches have started
    pub async fn wait_for_fetches(&self, count: usize) {
        let mut started = self.fetches_started.subscribe();
        // The sender lives as long as `self`
        let _ = started.wait_for(|n| *n >= count).await;
    }

    /// Keys passed to `get`, in call order
    pub fn get_calls(&self) -> Vec<ProjectionKey> {
        self.get_calls.lock().clone()
    }

    /// Number of `all` calls
    pub fn all_calls(&self) -> usize {
        self.all_calls.load(Ordering::SeqCst)
    }

    async fn begin_fetch(&self) -> Result<()> {
        self.fetches_started.send_modify(|n| *n += 1);

        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        if self.failing.load(Ordering::SeqCst) {
            return Err(ShadesError::Store("store unavailable".into()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn get(&self, namespace: &str, projection_name: &str) -> Result<Option<Snapshot>> {
        self.get_calls
            .lock()
            .push(ProjectionKey::new(namespace, projection_name));
        self.begin_fetch().await?;

        Ok(self
            .snapshots
            .read()
            .get(namespace)
            .and_then(|projections| projections.get(projection_name))
            .cloned())
    }

    async fn all(&self) -> Result<SnapshotSet> {
        self.all_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_fetch().await?;

        Ok(self.snapshots.read().clone())
    }
}
