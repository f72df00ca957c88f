use crate::{Checkpoint, CheckpointKey, CheckpointSaver, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory [`CheckpointSaver`], suitable for tests and single-process
/// deployments. Mirrors `langgraph_checkpoint::InMemoryCheckpointSaver`'s
/// role as the default backend when no durable store is wired up.
#[derive(Default)]
pub struct InMemoryCheckpointSaver {
    checkpoints: RwLock<HashMap<CheckpointKey, Checkpoint>>,
}

impl InMemoryCheckpointSaver {
    /// Create an empty saver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct `(run_id, thread_id)` slots currently stored.
    pub fn len(&self) -> usize {
        self.checkpoints.read().unwrap().len()
    }

    /// True if no checkpoints are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CheckpointSaver for InMemoryCheckpointSaver {
    async fn put(&self, key: CheckpointKey, checkpoint: Checkpoint) -> Result<()> {
        self.checkpoints.write().unwrap().insert(key, checkpoint);
        Ok(())
    }

    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.read().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &CheckpointKey) -> Result<()> {
        self.checkpoints.write().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let saver = InMemoryCheckpointSaver::new();
        let key = CheckpointKey::for_run(Uuid::new_v4());
        let checkpoint = Checkpoint::new(json!({"x": 1}), 1, Some("human_input".into()));

        saver.put(key.clone(), checkpoint.clone()).await.unwrap();
        let loaded = saver.get(&key).await.unwrap().unwrap();
        assert_eq!(loaded.step, 1);
        assert_eq!(loaded.next_node.as_deref(), Some("human_input"));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let saver = InMemoryCheckpointSaver::new();
        let key = CheckpointKey::for_run(Uuid::new_v4());
        assert!(saver.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let saver = InMemoryCheckpointSaver::new();
        let key = CheckpointKey::for_run(Uuid::new_v4());
        saver
            .put(key.clone(), Checkpoint::new(json!({}), 1, None))
            .await
            .unwrap();
        assert_eq!(saver.len(), 1);
        saver.delete(&key).await.unwrap();
        assert!(saver.get(&key).await.unwrap().is_none());
        assert!(saver.is_empty());
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let saver = InMemoryCheckpointSaver::new();
        let key = CheckpointKey::for_run(Uuid::new_v4());
        saver
            .put(key.clone(), Checkpoint::new(json!({"v": 1}), 1, None))
            .await
            .unwrap();
        saver
            .put(key.clone(), Checkpoint::new(json!({"v": 2}), 2, None))
            .await
            .unwrap();
        let loaded = saver.get(&key).await.unwrap().unwrap();
        assert_eq!(loaded.step, 2);
        assert_eq!(loaded.state, json!({"v": 2}));
    }
}
