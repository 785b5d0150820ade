pub mod service;

pub use service::{PluginDescriptor, ServiceConfig};
