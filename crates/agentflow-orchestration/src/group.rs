use agentflow_graph::RunStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// The four join semantics `spec.md` §4.7 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    BestEffort,
    FailFast,
    Quorum,
    FirstSuccess,
}

impl JoinMode {
    /// `"all"` is accepted as an alias for `best_effort`, matching
    /// `original_source`'s `_normalize_join_mode`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" | "best_effort" => Some(JoinMode::BestEffort),
            "fail_fast" => Some(JoinMode::FailFast),
            "quorum" => Some(JoinMode::Quorum),
            "first_success" => Some(JoinMode::FirstSuccess),
            _ => None,
        }
    }
}

/// A cohort of sibling runs spawned together by one `spawn_group` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationGroup {
    pub id: Uuid,
    pub orchestrator_run_id: Uuid,
    pub member_run_ids: Vec<Uuid>,
    pub join_mode: JoinMode,
    pub quorum_threshold: Option<u32>,
    pub timeout_s: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub status: GroupStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Running,
    Completed,
    Failed,
    TimedOut,
    CompletedWithErrors,
}

/// The outcome of one `join` evaluation: whether the group is decided yet,
/// what it decided, and which still-active members should be cancelled as
/// a result (`spec.md` §4.7: a `first_success`/`quorum`/`fail_fast`
/// decision propagates cancellation to the losing siblings).
#[derive(Debug, Clone)]
pub struct JoinDecision {
    pub complete: bool,
    pub status: GroupStatus,
    pub success_count: u32,
    pub failure_count: u32,
    pub running_count: u32,
    pub cancellation_reason: Option<&'static str>,
}

/// Evaluate a group's join decision from its members' current statuses.
/// Grounded in `original_source`'s `OrchestrationKernelService.join`
/// state machine, translated from its four `if effective_mode == ...`
/// branches into one match.
pub fn evaluate_join(
    mode: JoinMode,
    quorum_threshold: Option<u32>,
    member_statuses: &[RunStatus],
    elapsed_s: u64,
    timeout_s: u64,
) -> JoinDecision {
    let total = member_statuses.len() as u32;
    let success = member_statuses.iter().filter(|s| **s == RunStatus::Completed).count() as u32;
    let failed = member_statuses
        .iter()
        .filter(|s| matches!(s, RunStatus::Failed | RunStatus::Cancelled))
        .count() as u32;
    let running = total - success - failed;

    let (mut complete, mut status, mut reason) = match mode {
        JoinMode::FirstSuccess => {
            if success >= 1 {
                (true, GroupStatus::Completed, Some("join_first_success"))
            } else if running == 0 {
                (true, GroupStatus::Failed, None)
            } else {
                (false, GroupStatus::Running, None)
            }
        }
        JoinMode::Quorum => {
            let threshold = quorum_threshold.unwrap_or(total).min(total);
            if success >= threshold {
                (true, GroupStatus::Completed, Some("join_quorum_reached"))
            } else if success + running < threshold {
                (true, GroupStatus::Failed, None)
            } else {
                (false, GroupStatus::Running, None)
            }
        }
        JoinMode::FailFast => {
            if failed > 0 {
                (true, GroupStatus::Failed, Some("join_fail_fast"))
            } else if running == 0 {
                (true, GroupStatus::Completed, None)
            } else {
                (false, GroupStatus::Running, None)
            }
        }
        JoinMode::BestEffort => {
            if running == 0 {
                let status = if failed == 0 {
                    GroupStatus::Completed
                } else {
                    GroupStatus::CompletedWithErrors
                };
                (true, status, None)
            } else {
                (false, GroupStatus::Running, None)
            }
        }
    };

    if !complete && timeout_s > 0 && elapsed_s >= timeout_s {
        complete = true;
        status = GroupStatus::TimedOut;
        reason = Some("join_timed_out");
    }

    JoinDecision {
        complete,
        status,
        success_count: success,
        failure_count: failed,
        running_count: if complete && reason.is_some() { 0 } else { running },
        cancellation_reason: reason,
    }
}

/// In-memory group store.
#[derive(Default)]
pub struct GroupTable {
    groups: RwLock<HashMap<Uuid, OrchestrationGroup>>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, group: OrchestrationGroup) {
        self.groups.write().unwrap().insert(group.id, group);
    }

    pub fn get(&self, id: Uuid) -> Option<OrchestrationGroup> {
        self.groups.read().unwrap().get(&id).cloned()
    }

    pub fn set_status(&self, id: Uuid, status: GroupStatus) {
        if let Some(group) = self.groups.write().unwrap().get_mut(&id) {
            group.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_completes_only_once_all_members_are_terminal() {
        let decision = evaluate_join(
            JoinMode::BestEffort,
            None,
            &[RunStatus::Completed, RunStatus::Running],
            0,
            300,
        );
        assert!(!decision.complete);

        let decision = evaluate_join(
            JoinMode::BestEffort,
            None,
            &[RunStatus::Completed, RunStatus::Failed],
            0,
            300,
        );
        assert!(decision.complete);
        assert_eq!(decision.status, GroupStatus::CompletedWithErrors);
    }

    #[test]
    fn first_success_completes_as_soon_as_one_succeeds() {
        let decision = evaluate_join(
            JoinMode::FirstSuccess,
            None,
            &[RunStatus::Completed, RunStatus::Running],
            0,
            300,
        );
        assert!(decision.complete);
        assert_eq!(decision.status, GroupStatus::Completed);
        assert_eq!(decision.cancellation_reason, Some("join_first_success"));
    }

    #[test]
    fn quorum_fails_early_when_unreachable() {
        let decision = evaluate_join(
            JoinMode::Quorum,
            Some(2),
            &[RunStatus::Failed, RunStatus::Failed, RunStatus::Running],
            0,
            300,
        );
        assert!(decision.complete);
        assert_eq!(decision.status, GroupStatus::Failed);
    }

    #[test]
    fn fail_fast_trips_on_first_failure() {
        let decision = evaluate_join(
            JoinMode::FailFast,
            None,
            &[RunStatus::Failed, RunStatus::Running],
            0,
            300,
        );
        assert!(decision.complete);
        assert_eq!(decision.status, GroupStatus::Failed);
        assert_eq!(decision.cancellation_reason, Some("join_fail_fast"));
    }

    #[test]
    fn timeout_overrides_a_still_running_decision() {
        let decision = evaluate_join(
            JoinMode::BestEffort,
            None,
            &[RunStatus::Running],
            301,
            300,
        );
        assert!(decision.complete);
        assert_eq!(decision.status, GroupStatus::TimedOut);
    }
}
