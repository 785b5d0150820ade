pub mod broker;
pub mod projection;
pub mod store;

pub use broker::{Broker, UpdateStream};
pub use projection::{Projection, ProjectionFactory};
pub use store::Store;
