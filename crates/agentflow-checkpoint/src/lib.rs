//! Checkpoint trait abstraction and in-memory implementation.
//!
//! A [`Checkpoint`] is an opaque, serialized snapshot of a run's in-flight
//! [`agentflow_graph`](../agentflow_graph/index.html)-level `State`, keyed by
//! `(run_id, thread_id)` as `spec.md` §3 requires. This crate only defines
//! the storage contract ([`CheckpointSaver`]) and ships an in-memory backend
//! suitable for tests and single-process deployments; a production backend
//! (Postgres, Redis, …) is an external collaborator per `spec.md` §1 and
//! implements the same trait.

mod error;
mod memory;
mod types;

pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointSaver;
pub use types::{Checkpoint, CheckpointKey};

use async_trait::async_trait;

/// Storage backend for [`Checkpoint`]s.
///
/// Implementations must be safe to share across the engine task and any
/// inspection/admin task via `Arc<dyn CheckpointSaver>`.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Persist `checkpoint` under `key`, replacing any prior value.
    async fn put(&self, key: CheckpointKey, checkpoint: Checkpoint) -> Result<()>;

    /// Fetch the checkpoint stored under `key`, if any.
    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>>;

    /// Remove the checkpoint stored under `key`, if any. Used once a run
    /// reaches a terminal status and no further resume is possible.
    async fn delete(&self, key: &CheckpointKey) -> Result<()>;
}
