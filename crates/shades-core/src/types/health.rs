use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream dependency whose liveness is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Store,
    Broker,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Store => "store",
            Component::Broker => "broker",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection notification emitted by a store or broker client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Error,
}

/// Liveness of both upstream dependencies, returned by value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub store: bool,
    pub broker: bool,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        self.store && self.broker
    }

    pub fn get(&self, component: Component) -> bool {
        match component {
            Component::Store => self.store,
            Component::Broker => self.broker,
        }
    }

    /// The single subsystem blamed when the service is unhealthy.
    ///
    /// The broker is reported first when both are down.
    pub fn unavailable(&self) -> Option<Component> {
        if !self.broker {
            Some(Component::Broker)
        } else if !self.store {
            Some(Component::Store)
        } else {
            None
        }
    }
}
