use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShadesError {
    #[error("Unknown projection type: {0}")]
    UnknownProjection(String),

    #[error("Invalid plugin '{name}': {reason}")]
    InvalidPlugin { name: String, reason: String },

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ShadesError {
    /// True for failures that come from an upstream collaborator rather than
    /// from projection logic.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ShadesError::Store(_) | ShadesError::Broker(_))
    }
}

pub type Result<T> = std::result::Result<T, ShadesError>;

// Projection implementations are free to use their own error types. Map them
// into `ShadesError::Projection` at the `apply_delta` boundary, or rely on the
// `#[from] anyhow::Error` variant:
//
// impl Projection for Graph {
//     fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
//         let edge: Edge = serde_json::from_value(delta.clone())?;
//         self.edges.insert(edge).map_err(|e| ShadesError::Projection(e.to_string()))
//     }
// }
