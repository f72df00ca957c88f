//! Event stream pipeline.
//!
//! Ground truth for this crate is `langgraph-core::stream` /
//! `llm_stream` generalized together with
//! `original_source/backend/app/agent/execution/emitter.py`'s
//! fire-and-forget `EventEmitter`: node executors emit events through an
//! [`Emitter`] that never blocks and never fails; the [`Engine`] (in
//! `agentflow-graph`) drains a bounded [`EventQueue`] concurrently with
//! driving the workflow, normalizing and tagging every event with a
//! [`Visibility`], and a [`StreamFilter`] narrows what a given consumer
//! [`StreamMode`] actually sees.

mod emitter;
mod event;
mod filter;
mod normalize;
mod queue;

pub use emitter::{ambient_emitter, run_with_emitter, Emitter};
pub use event::{EventKind, ExecutionEvent, Visibility};
pub use filter::{StreamFilter, StreamMode};
pub use normalize::normalize;
pub use queue::{EventQueue, EventReceiver, EventSender, DEFAULT_QUEUE_CAPACITY};
