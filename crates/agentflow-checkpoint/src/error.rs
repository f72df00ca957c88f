use thiserror::Error;

/// Errors that can occur while persisting or loading checkpoints.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint payload could not be (de)serialized.
    #[error("checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend itself failed (I/O, network, …).
    #[error("checkpoint storage failed: {0}")]
    Storage(String),
}

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;
