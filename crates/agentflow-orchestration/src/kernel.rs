//! [`Kernel`] — the concrete [`agentflow_graph::OrchestrationPort`]
//! implementation wired in at `agentflow-runtime`. Grounded end to end in
//! `original_source/backend/app/services/orchestration_kernel_service.py`'s
//! `OrchestrationKernelService`: this struct owns the same bookkeeping
//! (lineage, groups, idempotency) and delegates everything that requires
//! actually running an agent to a [`crate::host::RunHost`].

use crate::group::{evaluate_join, GroupStatus, GroupTable, JoinMode, OrchestrationGroup};
use crate::host::RunHost;
use crate::lineage::{LineageTable, RunLineage};
use crate::policy::SpawnPolicy;
use agentflow_graph::{OrchestrationPort, RunStatus};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("'{field}' is not a valid run id: {raw}"))
}

/// One `(parent_run_id, spawn_key)` pair identifies a spawn request
/// idempotently, mirroring the Python service's idempotency-key lookup:
/// a retried `spawn_run` with the same key returns the existing child
/// rather than creating a second one.
type IdempotencyKey = (Uuid, String);

pub struct Kernel {
    lineage: LineageTable,
    groups: GroupTable,
    policy: SpawnPolicy,
    host: Arc<dyn RunHost>,
    idempotency: RwLock<HashMap<IdempotencyKey, Uuid>>,
}

impl Kernel {
    pub fn new(host: Arc<dyn RunHost>, policy: SpawnPolicy) -> Self {
        Self {
            lineage: LineageTable::new(),
            groups: GroupTable::new(),
            policy,
            host,
            idempotency: RwLock::new(HashMap::new()),
        }
    }

    /// Register the caller itself as a lineage root if this is the first
    /// time the kernel has seen it (the engine doesn't call
    /// `register_root` directly; the kernel lazily adopts unseen callers
    /// as depth-0 so a first `spawn_run` from a top-level run doesn't
    /// require a separate registration step).
    fn lineage_of(&self, caller_run_id: Uuid, tenant_id: Uuid) -> RunLineage {
        if let Some(existing) = self.lineage.get(caller_run_id) {
            existing
        } else {
            self.lineage.register_root(caller_run_id, tenant_id);
            self.lineage.get(caller_run_id).expect("just registered")
        }
    }

    async fn spawn_one(
        &self,
        caller_run_id: Uuid,
        parent_node_id: Option<String>,
        target_agent_slug: &str,
        input_params: Value,
        spawn_key: String,
        requested_scopes: Option<&[String]>,
        orchestration_group_id: Option<Uuid>,
    ) -> Result<Uuid, String> {
        self.host
            .run_status(caller_run_id)
            .await
            .ok_or_else(|| format!("caller run '{caller_run_id}' not found"))?;

        let parent_lineage = self
            .lineage
            .get(caller_run_id)
            .unwrap_or(RunLineage {
                tenant_id: caller_run_id,
                root_run_id: caller_run_id,
                parent_run_id: None,
                depth: 0,
            });

        self.policy.assert_spawn_limits(parent_lineage.depth, 1)?;
        self.policy.assert_target_allowed(target_agent_slug)?;

        if let Some(requested) = requested_scopes {
            let effective = self.host.effective_scopes(caller_run_id).await;
            self.policy.assert_scope_subset(requested, &effective)?;
        }

        let key = (caller_run_id, spawn_key.clone());
        if let Some(existing) = self.idempotency.read().unwrap().get(&key).copied() {
            return Ok(existing);
        }

        let child_id = self
            .host
            .launch_child(
                parent_lineage.tenant_id,
                parent_lineage.root_run_id,
                caller_run_id,
                parent_node_id,
                parent_lineage.depth + 1,
                spawn_key.clone(),
                orchestration_group_id,
                target_agent_slug,
                input_params,
            )
            .await?;

        self.lineage.register_child(
            child_id,
            RunLineage {
                tenant_id: parent_lineage.tenant_id,
                root_run_id: parent_lineage.root_run_id,
                parent_run_id: Some(caller_run_id),
                depth: parent_lineage.depth + 1,
            },
        );
        self.idempotency.write().unwrap().insert(key, child_id);
        Ok(child_id)
    }
}

#[async_trait]
impl OrchestrationPort for Kernel {
    async fn spawn_run(&self, caller_run_id: &str, request: Value) -> Result<Value, String> {
        let caller = parse_uuid(caller_run_id, "caller_run_id")?;
        let target = request
            .get("target_agent_slug")
            .and_then(Value::as_str)
            .ok_or("spawn_run request missing 'target_agent_slug'")?;
        let spawn_key = request
            .get("spawn_key")
            .and_then(Value::as_str)
            .unwrap_or(target)
            .to_string();
        let input_params = request.get("input_params").cloned().unwrap_or(json!({}));
        let parent_node_id = request
            .get("parent_node_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let requested_scopes: Option<Vec<String>> = request
            .get("scopes")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());

        let child_id = self
            .spawn_one(
                caller,
                parent_node_id,
                target,
                input_params,
                spawn_key,
                requested_scopes.as_deref(),
                None,
            )
            .await?;

        Ok(json!({ "run_id": child_id.to_string(), "status": "queued" }))
    }

    async fn spawn_group(&self, caller_run_id: &str, request: Value) -> Result<Value, String> {
        let caller = parse_uuid(caller_run_id, "caller_run_id")?;
        let targets = request
            .get("targets")
            .and_then(Value::as_array)
            .ok_or("spawn_group request missing 'targets'")?;
        if targets.is_empty() {
            return Err("spawn_group requires at least one target".to_string());
        }
        let parent_lineage = self.lineage_of(caller, caller);
        self.policy
            .assert_spawn_limits(parent_lineage.depth, targets.len() as u32)?;

        let join_mode_raw = request.get("join_mode").and_then(Value::as_str).unwrap_or("best_effort");
        let join_mode = JoinMode::parse(join_mode_raw).ok_or_else(|| format!("unknown join_mode '{join_mode_raw}'"))?;
        let quorum_threshold = request.get("quorum_threshold").and_then(Value::as_u64).map(|n| n as u32);
        let timeout_s = request.get("timeout_s").and_then(Value::as_u64).unwrap_or(self.policy.join_timeout_s);

        let group_id = Uuid::new_v4();
        let mut member_run_ids = Vec::with_capacity(targets.len());
        for (idx, target) in targets.iter().enumerate() {
            let slug = target
                .get("target_agent_slug")
                .and_then(Value::as_str)
                .ok_or("each spawn_group target needs 'target_agent_slug'")?;
            let input_params = target.get("input_params").cloned().unwrap_or(json!({}));
            let spawn_key = format!("group:{group_id}:{idx}");
            let child_id = self
                .spawn_one(caller, None, slug, input_params, spawn_key, None, Some(group_id))
                .await?;
            member_run_ids.push(child_id);
        }

        self.groups.insert(OrchestrationGroup {
            id: group_id,
            orchestrator_run_id: caller,
            member_run_ids: member_run_ids.clone(),
            join_mode,
            quorum_threshold,
            timeout_s,
            started_at: chrono::Utc::now(),
            status: GroupStatus::Running,
        });

        Ok(json!({
            "group_id": group_id.to_string(),
            "member_run_ids": member_run_ids.iter().map(Uuid::to_string).collect::<Vec<_>>(),
        }))
    }

    async fn join(&self, group_id: &str, request: Value) -> Result<Value, String> {
        let gid = parse_uuid(group_id, "group_id")?;
        let group = self.groups.get(gid).ok_or_else(|| format!("orchestration group '{group_id}' not found"))?;

        let mut statuses = Vec::with_capacity(group.member_run_ids.len());
        for run_id in &group.member_run_ids {
            statuses.push(self.host.run_status(*run_id).await.unwrap_or(RunStatus::Failed));
        }

        let elapsed_s = request.get("elapsed_s").and_then(Value::as_u64).unwrap_or_else(|| {
            (chrono::Utc::now() - group.started_at).num_seconds().max(0) as u64
        });

        let decision = evaluate_join(group.join_mode, group.quorum_threshold, &statuses, elapsed_s, group.timeout_s);

        if decision.complete {
            self.groups.set_status(gid, decision.status);
            if let Some(reason) = decision.cancellation_reason {
                for (run_id, status) in group.member_run_ids.iter().zip(statuses.iter()) {
                    if !status.is_terminal() {
                        let _ = self.host.cancel_run(*run_id, reason).await;
                    }
                }
            }
        }

        Ok(json!({
            "group_id": group_id,
            "complete": decision.complete,
            "status": format!("{:?}", decision.status).to_lowercase(),
            "success_count": decision.success_count,
            "failure_count": decision.failure_count,
            "running_count": decision.running_count,
        }))
    }

    async fn replan(&self, run_id: &str) -> Result<Value, String> {
        let run = parse_uuid(run_id, "run_id")?;
        let children = self.host.child_run_ids(run).await;
        let mut failed_children = Vec::new();
        for child in &children {
            match self.host.run_status(*child).await {
                Some(RunStatus::Failed) | Some(RunStatus::Cancelled) => failed_children.push(child.to_string()),
                _ => {}
            }
        }
        let needs_replan = !failed_children.is_empty();
        Ok(json!({
            "run_id": run_id,
            "needs_replan": needs_replan,
            "failed_children": failed_children,
            "suggested_action": if needs_replan { "respawn_failed_children" } else { "continue" },
        }))
    }

    async fn cancel_subtree(&self, run_id: &str, include_root: bool, reason: &str) -> Result<Value, String> {
        let root = parse_uuid(run_id, "run_id")?;

        let mut queue = vec![root];
        let mut subtree = Vec::new();
        let mut seen = std::collections::HashSet::new();
        seen.insert(root);
        while let Some(current) = queue.pop() {
            if current != root || include_root {
                subtree.push(current);
            }
            let mut children = self.lineage.known_children(current);
            children.extend(self.host.child_run_ids(current).await);
            for child in children {
                if seen.insert(child) {
                    queue.push(child);
                }
            }
        }

        let mut cancelled = Vec::new();
        for candidate in &subtree {
            if let Some(status) = self.host.run_status(*candidate).await {
                if !status.is_terminal() {
                    if self.host.cancel_run(*candidate, reason).await.is_ok() {
                        cancelled.push(candidate.to_string());
                    }
                }
            }
        }

        Ok(json!({
            "run_id": run_id,
            "cancelled_run_ids": cancelled,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeHost {
        statuses: Mutex<HashMap<Uuid, RunStatus>>,
        children: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                statuses: Mutex::new(HashMap::new()),
                children: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl RunHost for FakeHost {
        async fn launch_child(
            &self,
            _tenant_id: Uuid,
            _root_run_id: Uuid,
            parent_run_id: Uuid,
            _parent_node_id: Option<String>,
            _depth: u32,
            _spawn_key: String,
            _group_id: Option<Uuid>,
            _target_agent_slug: &str,
            _input_params: Value,
        ) -> Result<Uuid, String> {
            let child = Uuid::new_v4();
            self.statuses.lock().unwrap().insert(child, RunStatus::Running);
            self.children.lock().unwrap().entry(parent_run_id).or_default().push(child);
            Ok(child)
        }

        async fn run_status(&self, run_id: Uuid) -> Option<RunStatus> {
            self.statuses.lock().unwrap().get(&run_id).copied()
        }

        async fn cancel_run(&self, run_id: Uuid, _reason: &str) -> Result<(), String> {
            self.statuses.lock().unwrap().insert(run_id, RunStatus::Cancelled);
            Ok(())
        }

        async fn effective_scopes(&self, _run_id: Uuid) -> Vec<String> {
            vec!["read:docs".to_string()]
        }

        async fn child_run_ids(&self, run_id: Uuid) -> Vec<Uuid> {
            self.children.lock().unwrap().get(&run_id).cloned().unwrap_or_default()
        }
    }

    fn kernel_with_caller(host: &Arc<FakeHost>, caller: Uuid) -> Kernel {
        host.statuses.lock().unwrap().insert(caller, RunStatus::Running);
        Kernel::new(host.clone(), SpawnPolicy::default())
    }

    #[tokio::test]
    async fn spawn_run_is_idempotent_on_spawn_key() {
        let host = Arc::new(FakeHost::new());
        let caller = Uuid::new_v4();
        let kernel = kernel_with_caller(&host, caller);

        let request = json!({"target_agent_slug": "research-agent", "spawn_key": "k1"});
        let first = kernel.spawn_run(&caller.to_string(), request.clone()).await.unwrap();
        let second = kernel.spawn_run(&caller.to_string(), request).await.unwrap();
        assert_eq!(first["run_id"], second["run_id"]);
    }

    #[tokio::test]
    async fn spawn_group_and_join_best_effort() {
        let host = Arc::new(FakeHost::new());
        let caller = Uuid::new_v4();
        let kernel = kernel_with_caller(&host, caller);

        let request = json!({
            "targets": [
                {"target_agent_slug": "a"},
                {"target_agent_slug": "b"},
            ],
            "join_mode": "best_effort",
        });
        let spawned = kernel.spawn_group(&caller.to_string(), request).await.unwrap();
        let group_id = spawned["group_id"].as_str().unwrap().to_string();
        let member_ids: Vec<Uuid> = spawned["member_run_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| Uuid::parse_str(v.as_str().unwrap()).unwrap())
            .collect();

        let still_running = kernel.join(&group_id, json!({})).await.unwrap();
        assert_eq!(still_running["complete"], json!(false));

        for id in &member_ids {
            host.statuses.lock().unwrap().insert(*id, RunStatus::Completed);
        }
        let done = kernel.join(&group_id, json!({})).await.unwrap();
        assert_eq!(done["complete"], json!(true));
        assert_eq!(done["status"], json!("completed"));
    }

    #[tokio::test]
    async fn cancel_subtree_excludes_root_by_default() {
        let host = Arc::new(FakeHost::new());
        let caller = Uuid::new_v4();
        let kernel = kernel_with_caller(&host, caller);

        let spawned = kernel
            .spawn_run(&caller.to_string(), json!({"target_agent_slug": "worker"}))
            .await
            .unwrap();
        let child_id = spawned["run_id"].as_str().unwrap().to_string();

        let result = kernel.cancel_subtree(&caller.to_string(), false, "test").await.unwrap();
        let cancelled = result["cancelled_run_ids"].as_array().unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].as_str().unwrap(), child_id);
        assert_eq!(host.run_status(caller).await, Some(RunStatus::Running));
    }

    #[tokio::test]
    async fn replan_flags_failed_children() {
        let host = Arc::new(FakeHost::new());
        let caller = Uuid::new_v4();
        let kernel = kernel_with_caller(&host, caller);

        let spawned = kernel
            .spawn_run(&caller.to_string(), json!({"target_agent_slug": "worker"}))
            .await
            .unwrap();
        let child_id = Uuid::parse_str(spawned["run_id"].as_str().unwrap()).unwrap();
        host.statuses.lock().unwrap().insert(child_id, RunStatus::Failed);

        let result = kernel.replan(&caller.to_string()).await.unwrap();
        assert_eq!(result["needs_replan"], json!(true));
    }
}
