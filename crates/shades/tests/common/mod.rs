//! Shared fixtures for the service integration tests

#![allow(dead_code)]

use serde_json::Value;
use shades::prelude::*;
use std::any::Any;
use std::future::Future;
use std::time::Duration;

/// Append-only projection: the snapshot is a JSON array, each delta is pushed
pub struct Graph {
    pub state: Vec<Value>,
}

impl Projection for Graph {
    fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        if delta.get("reject").and_then(Value::as_bool) == Some(true) {
            return Err(ShadesError::Projection("delta rejected".into()));
        }
        self.state.push(delta.clone());
        Ok(())
    }

    fn entity(&self, entity_type: &str, id: &str) -> Option<Value> {
        self.state
            .iter()
            .rev()
            .find(|d| d["type"] == entity_type && d["id"] == id)
            .cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn graph_factory(snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
    let state = match snapshot {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    Ok(Box::new(Graph { state }))
}

pub fn registry() -> ProjectionRegistry {
    ProjectionRegistry::new()
        .with("graph", graph_factory)
        .with("index", graph_factory)
}

/// Contents of a cached Graph
pub fn graph_state(handle: &ProjectionHandle) -> Vec<Value> {
    handle
        .read_as(|g: &Graph| g.state.clone())
        .expect("projection should be a Graph")
}

/// Poll `condition` until it holds, failing the test after one second
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Run `fut`, failing the test if it takes more than one second
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(1), fut)
        .await
        .expect("operation timed out")
}
