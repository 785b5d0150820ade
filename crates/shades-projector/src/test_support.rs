use serde_json::Value;
use shades_core::{Delta, Projection, ProjectionRegistry, Result, ShadesError, Snapshot};
use std::any::Any;

/// Append-only projection: snapshot is a JSON array, each delta is pushed.
/// Deltas carrying `"poison": true` are recorded and then rejected.
pub(crate) struct Graph {
    pub state: Vec<Value>,
}

impl Projection for Graph {
    fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        self.state.push(delta.clone());
        if delta.get("poison").and_then(Value::as_bool) == Some(true) {
            return Err(ShadesError::Projection("poisoned delta".into()));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn graph_factory(snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
    let state = match snapshot {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    Ok(Box::new(Graph { state }))
}

pub(crate) fn graph_registry() -> ProjectionRegistry {
    ProjectionRegistry::new()
        .with("graph", graph_factory)
        .with("tags", graph_factory)
}
