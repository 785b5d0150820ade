//! Projection registry
//!
//! Maps projection-type names to the factories that build them. The sync
//! service resolves every cache slot's projection name through this registry
//! when it instantiates, recovers or reloads an instance.
//!
//! # Example
//!
//! ```
//! use shades_core::{Delta, Projection, ProjectionRegistry, Result, Snapshot};
//! use std::any::Any;
//!
//! struct Counter(u64);
//!
//! impl Projection for Counter {
//!     fn apply_delta(&mut self, _delta: &Delta) -> Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let mut registry = ProjectionRegistry::new();
//! registry.register("counter", |snapshot: Option<Snapshot>| -> Result<Box<dyn Projection>> {
//!     let start = snapshot.and_then(|s| s.as_u64()).unwrap_or(0);
//!     Ok(Box::new(Counter(start)))
//! });
//!
//! assert!(registry.contains("counter"));
//! ```

use crate::error::{Result, ShadesError};
use crate::traits::{Projection, ProjectionFactory};
use crate::types::Snapshot;
use std::collections::HashMap;
use std::sync::Arc;

/// Named projection factories
#[derive(Clone, Default)]
pub struct ProjectionRegistry {
    factories: HashMap<String, Arc<dyn ProjectionFactory>>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`
    ///
    /// Panics if a factory with the same name is already registered.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: ProjectionFactory + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            panic!("Projection type '{}' already registered", name);
        }
        self.factories.insert(name, Arc::new(factory));
    }

    /// Try to register a factory, returning an error if the name is taken
    pub fn try_register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: ProjectionFactory + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ShadesError::InvalidState(format!(
                "Projection type '{}' already registered",
                name
            )));
        }
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Builder-style registration
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: ProjectionFactory + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn factory(&self, name: &str) -> Result<&dyn ProjectionFactory> {
        self.factories
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ShadesError::UnknownProjection(name.to_string()))
    }

    /// Build a new instance of `name` from an optional snapshot
    pub fn create(&self, name: &str, snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
        self.factory(name)?.create(snapshot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// List all registered projection types
    pub fn projection_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Delta;
    use serde_json::json;
    use std::any::Any;

    struct Log(Vec<Delta>);

    impl Projection for Log {
        fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
            self.0.push(delta.clone());
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn log_factory(snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
        let entries = match snapshot {
            Some(serde_json::Value::Array(items)) => items,
            Some(other) => {
                return Err(ShadesError::Projection(format!("bad snapshot: {}", other)));
            }
            None => Vec::new(),
        };
        Ok(Box::new(Log(entries)))
    }

    #[test]
    fn test_create_from_snapshot() {
        let registry = ProjectionRegistry::new().with("log", log_factory);

        let projection = registry.create("log", Some(json!([1, 2]))).unwrap();
        let log = projection.as_any().downcast_ref::<Log>().unwrap();
        assert_eq!(log.0, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_unknown_projection() {
        let registry = ProjectionRegistry::new();
        assert!(matches!(
            registry.create("missing", None),
            Err(ShadesError::UnknownProjection(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = ProjectionRegistry::new().with("log", log_factory);
        assert!(matches!(
            registry.create("log", Some(json!("nope"))),
            Err(ShadesError::Projection(_))
        ));
    }

    #[test]
    fn test_try_register_duplicate() {
        let mut registry = ProjectionRegistry::new();
        registry.try_register("log", log_factory).unwrap();
        assert!(registry.try_register("log", log_factory).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_projection_types() {
        let registry = ProjectionRegistry::new()
            .with("log", log_factory)
            .with("graph", log_factory);

        let mut types = registry.projection_types();
        types.sort_unstable();
        assert_eq!(types, vec!["graph", "log"]);
        assert!(registry.contains("graph"));
        assert!(!registry.contains("tags"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_register_duplicate_panics() {
        let mut registry = ProjectionRegistry::new();
        registry.register("log", log_factory);
        registry.register("log", log_factory);
    }
}
