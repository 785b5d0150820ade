use shades_core::{observe, Component, HealthState};
use std::sync::atomic::{AtomicBool, Ordering};

/// Liveness flags of the store and the broker.
///
/// Flags move only on explicit notifications: a connect sets one, an error
/// clears it. Nothing here times out or retries.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    store: AtomicBool,
    broker: AtomicBool,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, component: Component) -> &AtomicBool {
        match component {
            Component::Store => &self.store,
            Component::Broker => &self.broker,
        }
    }

    pub fn record_connect(&self, component: Component) {
        let was_up = self.flag(component).swap(true, Ordering::SeqCst);
        observe::set_health(component, true);
        if !was_up {
            tracing::info!(component = %component, "{} connected", component);
        }
    }

    pub fn record_error(&self, component: Component) {
        self.flag(component).store(false, Ordering::SeqCst);
        observe::set_health(component, false);
        tracing::error!(
            component = %component,
            "{} connection error. Service is now unhealthy.",
            component
        );
    }

    /// Current flags, by value
    pub fn status(&self) -> HealthState {
        HealthState {
            store: self.store.load(Ordering::SeqCst),
            broker: self.broker.load(Ordering::SeqCst),
        }
    }
}
