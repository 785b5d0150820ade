use async_trait::async_trait;
use parking_lot::Mutex;
use shades_core::{
    Broker, ChangeMessage, Command, ConnectionEvent, Result, ShadesError, UpdateStream,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc};

const EVENT_CAPACITY: usize = 64;

/// Default buffer of each update subscription
pub const DEFAULT_UPDATE_BUFFER: usize = 1024;

/// Broker held in memory.
///
/// Enqueued commands are kept for inspection; change messages are published
/// explicitly and fanned out, in order, to every live subscription.
pub struct MemoryBroker {
    events: broadcast::Sender<ConnectionEvent>,
    commands: Mutex<Vec<Command>>,
    subscribers: Mutex<Vec<mpsc::Sender<ChangeMessage>>>,
    update_buffer: usize,
    rejecting: AtomicBool,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_update_buffer(DEFAULT_UPDATE_BUFFER)
    }

    pub fn with_update_buffer(update_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            commands: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            update_buffer: update_buffer.max(1),
            rejecting: AtomicBool::new(false),
        }
    }

    /// Emit a connect notification
    pub fn connect(&self) {
        let _ = self.events.send(ConnectionEvent::Connected);
    }

    /// Emit an error notification
    pub fn disconnect(&self) {
        let _ = self.events.send(ConnectionEvent::Error);
    }

    /// Make `enqueue` fail (or succeed again)
    pub fn reject_commands(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Deliver a change message to every subscription.
    ///
    /// Returns how many subscriptions received it; closed ones are pruned.
    pub async fn publish(&self, message: ChangeMessage) -> usize {
        let subscribers = self.subscribers.lock().clone();

        let mut delivered = 0;
        for subscriber in &subscribers {
            if subscriber.send(message.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        self.subscribers.lock().retain(|s| !s.is_closed());
        tracing::trace!(
            namespace = %message.namespace,
            projection = %message.projection_name,
            delivered,
            "Published change message"
        );
        delivered
    }

    /// Number of open update subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !s.is_closed());
        subscribers.len()
    }

    /// Commands enqueued so far, in order
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    /// Take the enqueued commands, leaving the queue empty
    pub fn drain_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn enqueue(&self, command: Command) -> Result<()> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ShadesError::Broker("could not contact the broker".into()));
        }
        self.commands.lock().push(command);
        Ok(())
    }

    fn subscribe_updates(&self) -> Result<UpdateStream> {
        let (tx, rx) = mpsc::channel(self.update_buffer);
        self.subscribers.lock().push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shades_core::Operation;

    #[tokio::test]
    async fn test_publish_preserves_order() {
        let broker = MemoryBroker::new();
        let mut updates = broker.subscribe_updates().unwrap();

        for i in 0..3 {
            broker
                .publish(ChangeMessage::delta("acme", "graph", json!(i)))
                .await;
        }

        for i in 0..3 {
            let msg = updates.recv().await.unwrap();
            assert_eq!(msg.delta, Some(json!(i)));
        }
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let broker = MemoryBroker::new();
        let updates = broker.subscribe_updates().unwrap();
        assert_eq!(broker.subscriber_count(), 1);

        drop(updates);
        let delivered = broker
            .publish(ChangeMessage::refresh("acme", "graph"))
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_records_commands() {
        let broker = MemoryBroker::new();
        broker
            .enqueue(Command::namespace(Operation::Create, "acme"))
            .await
            .unwrap();

        broker.reject_commands(true);
        assert!(matches!(
            broker
                .enqueue(Command::namespace(Operation::Delete, "acme"))
                .await,
            Err(ShadesError::Broker(_))
        ));

        assert_eq!(
            broker.drain_commands(),
            vec![Command::namespace(Operation::Create, "acme")]
        );
        assert!(broker.commands().is_empty());
    }
}
