//! In-process implementations of the shades collaborator contracts.
//!
//! [`MemoryStore`] and [`MemoryBroker`] stand in for the durable store and
//! the message broker when the service runs embedded, in demos and in tests.

pub mod broker;
pub mod store;

pub use broker::{MemoryBroker, DEFAULT_UPDATE_BUFFER};
pub use store::MemoryStore;
