pub mod command;
pub mod health;
pub mod message;

pub use command::{Command, EntityPayload, EntityRef, Operation, RelationshipPayload};
pub use health::{Component, ConnectionEvent, HealthState};
pub use message::{
    ChangeMessage, Delta, Namespace, ProjectionKey, ProjectionName, Snapshot, SnapshotSet,
};
