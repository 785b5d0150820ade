use crate::error::{Result, ShadesError};
use crate::lock_manager::DEFAULT_LOCK_STRIPES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A plugin descriptor as configured.
///
/// `generator` names a callable in the plugin catalog supplied at setup; a
/// name that doesn't resolve to one is a fatal configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub generator: String,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator: generator.into(),
        }
    }
}

/// Configuration for the projection service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Number of stripes the per-key lock table is split into
    /// Default: 256
    #[serde(default = "default_lock_stripes")]
    pub lock_stripes: usize,

    /// Retry hint returned by an unhealthy health check (seconds)
    /// Default: 30s
    #[serde(default = "default_health_retry_after_secs")]
    pub health_retry_after_secs: u64,

    /// Plugins registered at setup, in order
    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,
}

fn default_lock_stripes() -> usize {
    DEFAULT_LOCK_STRIPES
}

fn default_health_retry_after_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lock_stripes: default_lock_stripes(),
            health_retry_after_secs: default_health_retry_after_secs(),
            plugins: Vec::new(),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lock_stripes == 0 {
            return Err(ShadesError::Config("lock_stripes must be positive".into()));
        }
        Ok(())
    }

    pub fn with_lock_stripes(mut self, stripes: usize) -> Self {
        self.lock_stripes = stripes;
        self
    }

    pub fn with_health_retry_after_secs(mut self, secs: u64) -> Self {
        self.health_retry_after_secs = secs;
        self
    }

    pub fn with_plugin(mut self, plugin: PluginDescriptor) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn health_retry_after(&self) -> Duration {
        Duration::from_secs(self.health_retry_after_secs)
    }
}
