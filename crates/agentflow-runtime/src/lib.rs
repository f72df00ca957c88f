//! Transport-agnostic runtime facade: wires [`agentflow_graph::Engine`],
//! [`agentflow_orchestration::Kernel`], and [`agentflow_stream`]'s event
//! queue together behind [`api::Runtime`].
//!
//! `spec.md` §1 scopes this crate as library-first: no HTTP/SSE router,
//! auth layer, or persistent store lives here. A host application
//! supplies its own storage (implementing [`ports::AgentStore`]/
//! [`ports::RunStore`]), its own model/tool/RAG backends, and its own
//! transport, formatting outgoing events with [`sse::format_event`] if it
//! chooses SSE. Grounded in `orchestrator::AppState`'s service wiring,
//! generalized down to a pure library surface.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod ports;
pub mod sse;

pub use api::{Runtime, StartedRun};
pub use config::RuntimeConfig;
pub use error::{AgentflowError, Result};
pub use host::RuntimeHost;
pub use ports::{AgentStore, Clock, DelegationService, ModelProvider, RagPipelines, RunStore, SystemClock, ToolImplementations};
