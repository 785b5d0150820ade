//! Shades: projection synchronization for a namespaced entity/relationship store
//!
//! Writes reach the store as commands queued on a broker; reads are served
//! from in-memory projections. This crate keeps those projections current:
//! - **Change ingestion**: change messages from the broker patch cached
//!   projections in place, or recover them from the store
//! - **Reload**: every broker (re)connect rebuilds the cache from the store
//! - **Health**: store and broker liveness, with a ready-made health report
//! - **Plugins**: named custom queries over cached projections
//!
//! # Quick Start
//!
//! ```no_run
//! use shades::prelude::*;
//! use shades::{MemoryBroker, MemoryStore};
//!
//! # async fn run(registry: ProjectionRegistry) -> Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let broker = Arc::new(MemoryBroker::new());
//! let service = ProjectionService::builder(store.clone(), broker.clone())
//!     .with_registry(registry)
//!     .build()?;
//!
//! let subscription = service.setup()?;
//! store.connect();
//! broker.connect();
//!
//! println!("{}", service.health_report().body());
//! subscription.unsubscribe().await;
//! # Ok(())
//! # }
//! ```

pub mod health_check;
pub mod plugin;
pub mod prelude;
pub mod service;
pub mod subscription;

// Re-export core types
pub use shades_core::{
    observe, Broker, ChangeMessage, Command, Component, ConnectionEvent, Delta, EntityPayload,
    EntityRef, HealthState, KeyLockManager, Namespace, Operation, PluginDescriptor, Projection,
    ProjectionFactory, ProjectionKey, ProjectionName, ProjectionRegistry, RelationshipPayload,
    Result, ServiceConfig, ShadesError, Snapshot, SnapshotSet, Store, UpdateStream,
};

// Re-export implementations
pub use shades_memory::{MemoryBroker, MemoryStore};
pub use shades_projector::{
    HealthMonitor, NamespaceProjections, ProjectionCache, ProjectionHandle, Projector,
    SyncStatsSnapshot,
};

// Re-export main types from this crate
pub use health_check::HealthReport;
pub use plugin::{Plugin, PluginCatalog, PluginFn};
pub use service::{ProjectionService, ServiceBuilder};
pub use subscription::Subscription;
