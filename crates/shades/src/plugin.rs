//! Custom-query plugins
//!
//! Plugins are configured as `{name, generator}` descriptors. The generator
//! names a callable registered in a [`PluginCatalog`]; setup resolves every
//! descriptor and refuses to start if one doesn't resolve.
//!
//! # Example
//!
//! ```
//! use shades::plugin::PluginCatalog;
//! use shades::PluginDescriptor;
//! use serde_json::json;
//!
//! let catalog = PluginCatalog::new().with("always.one", |_projection, _params| Ok(json!(1)));
//!
//! assert!(catalog.resolve(&PluginDescriptor::new("one", "always.one")).is_ok());
//! assert!(catalog.resolve(&PluginDescriptor::new("x", "not-a-function")).is_err());
//! ```

use shades_core::{PluginDescriptor, Projection, Result, ShadesError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Custom query handler: runs against one projection instance
pub type PluginFn =
    Arc<dyn Fn(&dyn Projection, &serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

/// A plugin resolved at setup
#[derive(Clone)]
pub struct Plugin {
    name: String,
    generator: PluginFn,
}

impl Plugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the plugin's query against `projection`
    pub fn call(
        &self,
        projection: &dyn Projection,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        (self.generator)(projection, params)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name).finish()
    }
}

/// Callables that plugin descriptors may name as their generator
#[derive(Clone, Default)]
pub struct PluginCatalog {
    generators: HashMap<String, PluginFn>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, generator: F)
    where
        F: Fn(&dyn Projection, &serde_json::Value) -> Result<serde_json::Value>
            + Send
            + Sync
            + 'static,
    {
        self.generators.insert(name.into(), Arc::new(generator));
    }

    pub fn with<F>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&dyn Projection, &serde_json::Value) -> Result<serde_json::Value>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, generator);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Resolve one descriptor into a callable plugin
    pub fn resolve(&self, descriptor: &PluginDescriptor) -> Result<Plugin> {
        if descriptor.name.is_empty() {
            return Err(ShadesError::InvalidPlugin {
                name: descriptor.name.clone(),
                reason: "name must not be empty".into(),
            });
        }

        let generator = self
            .generators
            .get(&descriptor.generator)
            .cloned()
            .ok_or_else(|| ShadesError::InvalidPlugin {
                name: descriptor.name.clone(),
                reason: format!(
                    "generator must be a function, '{}' is not registered",
                    descriptor.generator
                ),
            })?;

        Ok(Plugin {
            name: descriptor.name.clone(),
            generator,
        })
    }

    /// Resolve descriptors in order, failing on the first invalid or
    /// duplicate one
    pub fn resolve_all(&self, descriptors: &[PluginDescriptor]) -> Result<Vec<Plugin>> {
        let mut seen = HashSet::new();
        let mut plugins = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(ShadesError::InvalidPlugin {
                    name: descriptor.name.clone(),
                    reason: "plugin name registered twice".into(),
                });
            }
            plugins.push(self.resolve(descriptor)?);
        }

        Ok(plugins)
    }
}
