//! Shades Prelude
//!
//! ```
//! use shades::prelude::*;
//! ```

// Core types
pub use crate::{
    ChangeMessage, Command, Component, ConnectionEvent, Delta, EntityRef, HealthState, Namespace,
    Operation, ProjectionKey, ProjectionName, Result, ShadesError, Snapshot, SnapshotSet,
};

// Traits
pub use crate::{Broker, Projection, ProjectionFactory, Store};

// Configs
pub use crate::{PluginDescriptor, ServiceConfig};

// Service
pub use crate::{
    HealthReport, Plugin, PluginCatalog, ProjectionCache, ProjectionHandle, ProjectionRegistry,
    ProjectionService, Subscription,
};

// Re-export common external deps
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
