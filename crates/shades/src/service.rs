//! Projection service facade
//!
//! Owns the sync core and hands the query layer everything it reads or
//! enqueues against: the projection cache, the store, the broker, the
//! resolved plugins and the health flags.
//!
//! # Example
//!
//! ```no_run
//! use shades::prelude::*;
//! use shades::{MemoryBroker, MemoryStore};
//!
//! # async fn run(registry: ProjectionRegistry) -> Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let broker = Arc::new(MemoryBroker::new());
//!
//! let service = ProjectionService::builder(store, broker)
//!     .with_registry(registry)
//!     .build()?;
//! let subscription = service.setup()?;
//!
//! // ... serve queries against service.projections() ...
//!
//! subscription.unsubscribe().await;
//! # Ok(())
//! # }
//! ```

use crate::health_check::HealthReport;
use crate::plugin::{Plugin, PluginCatalog};
use crate::subscription::{consume_updates, watch_connection, Subscription};
use parking_lot::RwLock;
use shades_core::{
    Broker, ChangeMessage, Component, HealthState, ProjectionRegistry, Result, ServiceConfig,
    ShadesError, Store,
};
use shades_projector::{
    HealthMonitor, ProjectionCache, ProjectionHandle, Projector, SyncStatsSnapshot,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Builder for [`ProjectionService`]
pub struct ServiceBuilder {
    store: Arc<dyn Store>,
    broker: Arc<dyn Broker>,
    registry: ProjectionRegistry,
    catalog: PluginCatalog,
    config: ServiceConfig,
}

impl ServiceBuilder {
    pub fn new(store: Arc<dyn Store>, broker: Arc<dyn Broker>) -> Self {
        Self {
            store,
            broker,
            registry: ProjectionRegistry::new(),
            catalog: PluginCatalog::new(),
            config: ServiceConfig::default(),
        }
    }

    /// Projection types the service can instantiate
    pub fn with_registry(mut self, registry: ProjectionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Callables the configured plugins may name
    pub fn with_plugin_catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Arc<ProjectionService>> {
        self.config.validate()?;

        let projector = Projector::new(self.registry, self.store, &self.config);
        Ok(Arc::new(ProjectionService {
            config: self.config,
            projector: Arc::new(projector),
            health: Arc::new(HealthMonitor::new()),
            broker: self.broker,
            catalog: self.catalog,
            plugins: RwLock::new(Vec::new()),
            started: AtomicBool::new(false),
        }))
    }
}

/// The projection synchronization service
pub struct ProjectionService {
    config: ServiceConfig,
    projector: Arc<Projector>,
    health: Arc<HealthMonitor>,
    broker: Arc<dyn Broker>,
    catalog: PluginCatalog,
    plugins: RwLock<Vec<Plugin>>,
    started: AtomicBool,
}

impl ProjectionService {
    pub fn builder(store: Arc<dyn Store>, broker: Arc<dyn Broker>) -> ServiceBuilder {
        ServiceBuilder::new(store, broker)
    }

    /// Start the service.
    ///
    /// Resolves the configured plugins (an unresolvable generator fails here,
    /// before anything is subscribed), then attaches the health monitor to the
    /// store and broker notifications, reloads on every broker connect, and
    /// consumes the broker's update stream. Call once; the returned
    /// [`Subscription`] detaches everything on shutdown.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the listeners are
    /// spawned onto the current one.
    pub fn setup(&self) -> Result<Subscription> {
        let plugins = self.catalog.resolve_all(&self.config.plugins)?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ShadesError::InvalidState("service already set up".into()));
        }

        let updates = match self.broker.subscribe_updates() {
            Ok(updates) => updates,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        let plugin_count = plugins.len();
        *self.plugins.write() = plugins;

        let store_events = self.projector.store().connection_events();
        let broker_events = self.broker.connection_events();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = vec![
            tokio::spawn(watch_connection(
                Component::Store,
                store_events,
                self.health.clone(),
                self.projector.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(watch_connection(
                Component::Broker,
                broker_events,
                self.health.clone(),
                self.projector.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(consume_updates(updates, self.projector.clone(), shutdown_rx)),
        ];

        tracing::info!(plugins = plugin_count, "Projection service started");
        Ok(Subscription::new(shutdown_tx, tasks))
    }

    /// Liveness of the store and broker
    pub fn status(&self) -> HealthState {
        self.health.status()
    }

    /// Health-check response for the current status
    pub fn health_report(&self) -> HealthReport {
        HealthReport::new(self.status(), self.config.health_retry_after())
    }

    /// Apply a change message directly, for administrative refreshes
    pub async fn update_projection(&self, message: ChangeMessage) -> Result<ProjectionHandle> {
        self.projector.on_data_changed(message).await
    }

    /// Rebuild the cache from the store's full snapshot set
    pub async fn reload_projections(&self) -> Result<()> {
        self.projector.reload_projections().await
    }

    /// The live projection cache
    pub fn projections(&self) -> &Arc<ProjectionCache> {
        self.projector.cache()
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        self.projector.store()
    }

    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }

    /// Plugins resolved by `setup`, in configured order
    pub fn plugins(&self) -> Vec<Plugin> {
        self.plugins.read().clone()
    }

    pub fn plugin(&self, name: &str) -> Option<Plugin> {
        self.plugins.read().iter().find(|p| p.name() == name).cloned()
    }

    /// Run a plugin query against one cached projection
    pub fn query_custom(
        &self,
        namespace: &str,
        projection_name: &str,
        plugin: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let plugin = self
            .plugin(plugin)
            .ok_or_else(|| ShadesError::NotFound(format!("plugin '{}'", plugin)))?;
        let handle = self
            .projections()
            .get(namespace, projection_name)
            .ok_or_else(|| ShadesError::NotFound("projection not found".into()))?;

        let projection = handle.read();
        plugin.call(&**projection, params)
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.projector.stats()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
