use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tenant/domain scope of a set of projections
pub type Namespace = String;

/// Name of a projection type, resolved through the projection registry
pub type ProjectionName = String;

/// Incremental change payload, interpreted only by the projection that consumes it
pub type Delta = serde_json::Value;

/// Full-state payload used to (re)build a projection instance
pub type Snapshot = serde_json::Value;

/// Result of a bulk snapshot query: namespace -> projection name -> snapshot
pub type SnapshotSet = HashMap<Namespace, HashMap<ProjectionName, Snapshot>>;

/// A change notification delivered by the broker's update stream.
///
/// A message without a delta is a forced-refresh signal: the receiving
/// projection is reloaded from the store instead of patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeMessage {
    pub namespace: Namespace,
    pub projection_name: ProjectionName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
}

impl ChangeMessage {
    pub fn new(
        namespace: impl Into<Namespace>,
        projection_name: impl Into<ProjectionName>,
        delta: Option<Delta>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            projection_name: projection_name.into(),
            delta,
        }
    }

    /// A message carrying a delta to apply in place
    pub fn delta(
        namespace: impl Into<Namespace>,
        projection_name: impl Into<ProjectionName>,
        delta: Delta,
    ) -> Self {
        Self::new(namespace, projection_name, Some(delta))
    }

    /// A message asking for the projection to be reloaded from the store
    pub fn refresh(
        namespace: impl Into<Namespace>,
        projection_name: impl Into<ProjectionName>,
    ) -> Self {
        Self::new(namespace, projection_name, None)
    }

    pub fn key(&self) -> ProjectionKey {
        ProjectionKey::new(&self.namespace, &self.projection_name)
    }
}

/// Address of one cache slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectionKey {
    pub namespace: Namespace,
    pub projection_name: ProjectionName,
}

impl ProjectionKey {
    pub fn new(namespace: impl Into<Namespace>, projection_name: impl Into<ProjectionName>) -> Self {
        Self {
            namespace: namespace.into(),
            projection_name: projection_name.into(),
        }
    }

    /// Byte form used for lock striping (`namespace \0 projection_name`)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(self.namespace.len() + self.projection_name.len() + 1);
        bytes.extend_from_slice(self.namespace.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(self.projection_name.as_bytes());
        bytes
    }
}

impl fmt::Display for ProjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.projection_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_message_wire_format() {
        let msg: ChangeMessage = serde_json::from_value(json!({
            "namespace": "acme",
            "projection_name": "graph",
            "delta": {"op": "add", "id": "e1"}
        }))
        .unwrap();

        assert_eq!(msg.namespace, "acme");
        assert_eq!(msg.projection_name, "graph");
        assert_eq!(msg.delta, Some(json!({"op": "add", "id": "e1"})));
    }

    #[test]
    fn test_missing_delta_is_refresh() {
        let msg: ChangeMessage =
            serde_json::from_value(json!({"namespace": "acme", "projection_name": "graph"}))
                .unwrap();
        assert_eq!(msg, ChangeMessage::refresh("acme", "graph"));

        // Explicit null behaves the same
        let msg: ChangeMessage = serde_json::from_value(
            json!({"namespace": "acme", "projection_name": "graph", "delta": null}),
        )
        .unwrap();
        assert!(msg.delta.is_none());
    }

    #[test]
    fn test_key_bytes_are_unambiguous() {
        let a = ProjectionKey::new("ab", "c").to_bytes();
        let b = ProjectionKey::new("a", "bc").to_bytes();
        assert_ne!(a, b);
        assert_eq!(ProjectionKey::new("acme", "graph").to_string(), "acme/graph");
    }
}
