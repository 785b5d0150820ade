//! Embedded Projection Service Example
//!
//! Demonstrates:
//! - Registering a projection type and a custom-query plugin
//! - Reloading the cache when the broker connects
//! - Applying change messages published by the broker
//! - Health reporting and graceful shutdown
//!
//! Run with: RUST_LOG=shades=debug cargo run --example embedded

use serde_json::{json, Value};
use shades::prelude::*;
use shades::{MemoryBroker, MemoryStore};
use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Entities of one namespace, keyed by type then id
#[derive(Default)]
struct EntityIndex {
    entities: HashMap<String, HashMap<String, Value>>,
}

#[derive(Deserialize)]
struct EntityDelta {
    #[serde(rename = "type")]
    entity_type: String,
    id: String,
    #[serde(default)]
    data: Option<Value>,
}

impl EntityIndex {
    fn from_snapshot(snapshot: Option<Snapshot>) -> Result<Box<dyn Projection>> {
        let mut index = EntityIndex::default();
        if let Some(snapshot) = snapshot {
            let entities: Vec<EntityDelta> = serde_json::from_value(snapshot)?;
            for entity in entities {
                index.upsert(entity);
            }
        }
        Ok(Box::new(index))
    }

    fn upsert(&mut self, entity: EntityDelta) {
        let by_id = self.entities.entry(entity.entity_type).or_default();
        match entity.data {
            Some(data) => {
                by_id.insert(entity.id, data);
            }
            None => {
                by_id.remove(&entity.id);
            }
        }
    }

    fn count(&self) -> usize {
        self.entities.values().map(HashMap::len).sum()
    }
}

impl Projection for EntityIndex {
    fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        let entity: EntityDelta = serde_json::from_value(delta.clone())?;
        self.upsert(entity);
        Ok(())
    }

    fn entity(&self, entity_type: &str, id: &str) -> Option<Value> {
        self.entities.get(entity_type)?.get(id).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "shades=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Embedded Projection Service Example ===\n");

    let store = Arc::new(MemoryStore::new());
    let broker = Arc::new(MemoryBroker::new());
    store.put(
        "acme",
        "entities",
        json!([
            {"type": "user", "id": "1", "data": {"name": "Ada"}},
            {"type": "team", "id": "core", "data": {"size": 3}},
        ]),
    );

    let registry = ProjectionRegistry::new().with("entities", EntityIndex::from_snapshot);
    let catalog = PluginCatalog::new().with("entities.count", |projection, _params| {
        let count = projection
            .as_any()
            .downcast_ref::<EntityIndex>()
            .map(EntityIndex::count)
            .unwrap_or(0);
        Ok(json!({ "count": count }))
    });
    let config =
        ServiceConfig::default().with_plugin(PluginDescriptor::new("count", "entities.count"));

    let service = ProjectionService::builder(store.clone(), broker.clone())
        .with_registry(registry)
        .with_plugin_catalog(catalog)
        .with_config(config)
        .build()?;
    let subscription = service.setup()?;

    println!("1. Before connecting: {}", service.health_report().body());

    store.connect();
    broker.connect();
    while service.stats().reloads == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    println!("2. After connecting: {}", service.health_report().body());
    println!("   Loaded namespaces: {:?}", service.projections().namespaces());

    // A write is queued on the broker, and the resulting change comes back
    // as a delta
    service
        .broker()
        .enqueue(Command::entity(
            Operation::Create,
            "acme",
            EntityRef::new("user", "2"),
            Some(json!({"name": "Grace"})),
        ))
        .await?;
    broker
        .publish(ChangeMessage::delta(
            "acme",
            "entities",
            json!({"type": "user", "id": "2", "data": {"name": "Grace"}}),
        ))
        .await;
    while service.stats().deltas_applied == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let handle = service
        .projections()
        .get("acme", "entities")
        .ok_or_else(|| anyhow::anyhow!("projection not loaded"))?;
    println!("3. user/2 = {:?}", handle.read().entity("user", "2"));
    println!(
        "   count plugin = {}",
        service.query_custom("acme", "entities", "count", &Value::Null)?
    );

    broker.disconnect();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let report = service.health_report();
    println!(
        "4. Broker down: {} {} (retry after {:?})",
        report.status_code(),
        report.body(),
        report.retry_after()
    );

    subscription.unsubscribe().await;
    println!("\n5. Stats: {}", serde_json::to_string_pretty(&service.stats())?);

    Ok(())
}
