//! Background tasks started by `ProjectionService::setup`.

use shades_core::{Component, ConnectionEvent, UpdateStream};
use shades_projector::{HealthMonitor, Projector};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the service's listeners.
///
/// `unsubscribe` stops the update consumer and both connection watchers and
/// waits for them to exit. A message already being applied, and any reload
/// already started, runs to completion. Dropping the handle without calling
/// `unsubscribe` also stops the tasks, without waiting.
#[derive(Debug)]
pub struct Subscription {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(shutdown: watch::Sender<bool>, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { shutdown, tasks }
    }

    /// True while any listener is still running
    pub fn is_active(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    pub async fn unsubscribe(self) {
        self.shutdown.send_replace(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!("Listener task panicked: {}", e);
                }
            }
        }
        tracing::info!("Projection service unsubscribed");
    }
}

/// Feed connection notifications of one component into the health monitor.
/// A broker connect also triggers a full reload.
pub(crate) async fn watch_connection(
    component: Component,
    mut events: broadcast::Receiver<ConnectionEvent>,
    health: Arc<HealthMonitor>,
    projector: Arc<Projector>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Ok(ConnectionEvent::Connected) => {
                    health.record_connect(component);
                    if component == Component::Broker {
                        let projector = projector.clone();
                        // Failures are logged by the reload itself
                        tokio::spawn(async move {
                            let _ = projector.reload_projections().await;
                        });
                    }
                }
                Ok(ConnectionEvent::Error) => health.record_error(component),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(component = %component, skipped, "Missed connection notifications");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(component = %component, "Connection notifications closed");
                    break;
                }
            }
        }
    }
}

/// Apply change messages one at a time, in delivery order.
pub(crate) async fn consume_updates(
    mut updates: UpdateStream,
    projector: Arc<Projector>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            message = updates.recv() => match message {
                Some(message) => {
                    let key = message.key();
                    if let Err(e) = projector.on_data_changed(message).await {
                        tracing::error!(key = %key, error = %e, "Failed to apply change message");
                    }
                }
                None => {
                    tracing::info!("Update stream closed by broker");
                    break;
                }
            }
        }
    }
}
