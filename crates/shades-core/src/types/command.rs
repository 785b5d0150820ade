use super::message::Namespace;
use serde::{Deserialize, Serialize};

/// Write operation requested through the broker queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Reference to a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPayload {
    #[serde(flatten)]
    pub entity: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    pub a: EntityRef,
    pub b: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A command enqueued to the broker by the write path.
///
/// Commands are not validated here. Once processed upstream they surface
/// again as `ChangeMessage`s on the update stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub operation: Operation,
    pub namespace: Namespace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipPayload>,
}

impl Command {
    /// Create or delete a whole namespace
    pub fn namespace(operation: Operation, namespace: impl Into<Namespace>) -> Self {
        Self {
            operation,
            namespace: namespace.into(),
            entity: None,
            relationship: None,
        }
    }

    pub fn entity(
        operation: Operation,
        namespace: impl Into<Namespace>,
        entity: EntityRef,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            operation,
            namespace: namespace.into(),
            entity: Some(EntityPayload { entity, data }),
            relationship: None,
        }
    }

    pub fn relationship(
        operation: Operation,
        namespace: impl Into<Namespace>,
        a: EntityRef,
        b: EntityRef,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            operation,
            namespace: namespace.into(),
            entity: None,
            relationship: Some(RelationshipPayload { a, b, data }),
        }
    }
}
