//! Runs a linear `start -> set_state -> end` agent to completion and prints
//! every event it streams plus its final templated output.

use agentflow_demos::{agent_with_graph, build_runtime, edge, node, InMemoryAgentStore, InMemoryRunStore};
use agentflow_graph::{Graph, NodeType};
use serde_json::json;
use std::sync::Arc;
use tokio_stream::StreamExt;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let tenant_id = Uuid::new_v4();
    let agent_store = Arc::new(InMemoryAgentStore::new());
    let run_store = Arc::new(InMemoryRunStore::new());

    let graph = Graph {
        spec_version: "1".to_string(),
        nodes: vec![
            node("start", NodeType::Start, json!({})),
            node("set", NodeType::SetState, json!({"assignments": {"x": "world"}})),
            node("end", NodeType::End, json!({"output_message": "hello {{state.x}}"})),
        ],
        edges: vec![edge("e1", "start", "set"), edge("e2", "set", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "linear", graph));

    let runtime = build_runtime(agent_store, run_store.clone(), vec!["read:docs".to_string()]);
    let (started, mut stream) = runtime
        .run_and_stream(tenant_id, "linear", json!({}), "debug")
        .await
        .expect("agent slug is registered above");

    println!("started run {}", started.run_id);
    while let Some(event) = stream.next().await {
        println!("{} {}", event.event, event.data);
    }

    for _ in 0..50 {
        if let Some(run) = run_store.get(started.run_id).await {
            if run.status.is_terminal() {
                println!("final status: {:?}, output: {:?}", run.status, run.output_result);
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    eprintln!("run did not terminate in time");
}
