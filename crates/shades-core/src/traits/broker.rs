use crate::error::Result;
use crate::types::{ChangeMessage, Command, ConnectionEvent};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

/// Change messages delivered one at a time, in broker order
pub type UpdateStream = mpsc::Receiver<ChangeMessage>;

/// Message broker: commands out, change notifications in.
///
/// Like [`Store`](super::Store), the broker handles its own reconnection and
/// re-emits `ConnectionEvent::Connected` afterwards.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Receiver for connect/error notifications
    fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Queue a command for upstream processing
    async fn enqueue(&self, command: Command) -> Result<()>;

    /// Open a stream of change messages. Dropping the receiver unsubscribes.
    fn subscribe_updates(&self) -> Result<UpdateStream>;
}
