//! Shades Core: traits and types for the shades projection service
//!
//! Shades serves a namespaced entity/relationship store whose reads come from
//! in-memory projections kept current by a stream of change deltas. This
//! crate defines the pieces every other crate agrees on:
//! - Collaborator contracts: [`Store`] (authoritative snapshots) and
//!   [`Broker`] (command queue + update stream)
//! - The [`Projection`] trait and the [`ProjectionRegistry`] of named factories
//! - Wire types: [`ChangeMessage`], [`Command`], [`HealthState`]
//! - [`KeyLockManager`]: per-key writer serialization
//! - Service configuration and optional metrics hooks

pub mod config;
pub mod error;
pub mod lock_manager;
pub mod observe;
pub mod registry;
pub mod traits;
pub mod types;

pub use config::{PluginDescriptor, ServiceConfig};
pub use error::{Result, ShadesError};
pub use lock_manager::{KeyGuard, KeyLockManager};
pub use registry::ProjectionRegistry;
pub use traits::{Broker, Projection, ProjectionFactory, Store, UpdateStream};
pub use types::{
    ChangeMessage, Command, Component, ConnectionEvent, Delta, EntityPayload, EntityRef,
    HealthState, Namespace, Operation, ProjectionKey, ProjectionName, RelationshipPayload,
    Snapshot, SnapshotSet,
};
