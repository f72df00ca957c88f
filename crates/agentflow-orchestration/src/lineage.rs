use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// The lineage facts the kernel itself tracks about a run it spawned,
/// mirroring `spec.md` §8 invariant 4 (`root_run_id`/`parent_run_id`/
/// `depth` set at creation and never mutated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLineage {
    pub tenant_id: Uuid,
    pub root_run_id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub depth: u32,
}

/// In-memory lineage cache, keyed by run id. Populated as `spawn_run`
/// creates children; consulted by policy checks and `cancel_subtree`'s
/// BFS.
#[derive(Default)]
pub struct LineageTable {
    entries: RwLock<HashMap<Uuid, RunLineage>>,
    children: RwLock<HashMap<Uuid, Vec<Uuid>>>,
}

impl LineageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_root(&self, run_id: Uuid, tenant_id: Uuid) {
        self.entries.write().unwrap().insert(
            run_id,
            RunLineage {
                tenant_id,
                root_run_id: run_id,
                parent_run_id: None,
                depth: 0,
            },
        );
    }

    pub fn register_child(&self, run_id: Uuid, lineage: RunLineage) {
        if let Some(parent) = lineage.parent_run_id {
            self.children.write().unwrap().entry(parent).or_default().push(run_id);
        }
        self.entries.write().unwrap().insert(run_id, lineage);
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunLineage> {
        self.entries.read().unwrap().get(&run_id).cloned()
    }

    pub fn known_children(&self, run_id: Uuid) -> Vec<Uuid> {
        self.children.read().unwrap().get(&run_id).cloned().unwrap_or_default()
    }
}
