//! Orchestration kernel: spawn/join/cancel/replan semantics for
//! multi-agent delegation (`spec.md` §4.7), grounded end to end in
//! `original_source/backend/app/services/orchestration_kernel_service.py`.
//!
//! This crate owns bookkeeping only — lineage, groups, idempotency,
//! policy limits — and never drives a graph run itself. Anything that
//! requires actually starting, observing, or cancelling a run is asked
//! of a [`RunHost`], implemented by `agentflow-runtime`. [`Kernel`]
//! implements [`agentflow_graph::OrchestrationPort`], the trait node
//! executors in `agentflow-graph` call against; it is wired into
//! `agentflow_graph::Ports::orchestration` at the runtime layer.

mod error;
mod group;
mod host;
mod kernel;
mod lineage;
mod policy;

pub use error::{OrchestrationError, Result};
pub use group::{evaluate_join, GroupStatus, GroupTable, JoinDecision, JoinMode, OrchestrationGroup};
pub use host::RunHost;
pub use kernel::Kernel;
pub use lineage::{LineageTable, RunLineage};
pub use policy::SpawnPolicy;
