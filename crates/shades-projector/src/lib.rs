//! Shades Projector: projection cache synchronization
//!
//! Keeps an in-memory cache of projection instances current:
//! - Change ingestion: apply deltas in place, or recover a slot from the store
//! - Bulk reload: rebuild namespaces from the store's full snapshot set
//! - Health monitoring of the store and broker connections
//! - Per-key writer serialization, ordered against reloads

pub mod cache;
pub mod health;
mod ingestor;
pub mod projector;
mod reload;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use cache::{NamespaceProjections, ProjectionCache, ProjectionHandle};
pub use health::HealthMonitor;
pub use projector::Projector;
pub use stats::{SyncStats, SyncStatsSnapshot};
