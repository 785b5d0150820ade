use crate::error::Result;
use crate::types::{Delta, EntityRef, Snapshot};
use std::any::Any;

/// A materialized read model over one namespace.
///
/// The service only ever calls `apply_delta`; the read accessors exist for the
/// query layer and default to "not present" for projections that don't index
/// entities or relationships.
pub trait Projection: Send + Sync + 'static {
    /// Merge an incremental change into this instance in place
    fn apply_delta(&mut self, delta: &Delta) -> Result<()>;

    /// Look up an entity by type and id
    fn entity(&self, entity_type: &str, id: &str) -> Option<serde_json::Value> {
        let _ = (entity_type, id);
        None
    }

    /// Look up the relationship between two entities
    fn relationship(&self, a: &EntityRef, b: &EntityRef) -> Option<serde_json::Value> {
        let _ = (a, b);
        None
    }

    /// Access to the concrete type, for plugins and typed readers
    fn as_any(&self) -> &dyn Any;
}

/// Builds projection instances of one type, optionally from a snapshot
pub trait ProjectionFactory: Send + Sync {
    fn create(&self, snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>>;
}

impl<F> ProjectionFactory for F
where
    F: Fn(Option<Snapshot>) -> Result<Box<dyn Projection>> + Send + Sync,
{
    fn create(&self, snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
        self(snapshot)
    }
}
