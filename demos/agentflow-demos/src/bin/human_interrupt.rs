//! Runs an agent with a `human_input` node, waits for it to pause, then
//! resumes it with an approval payload and prints it through to completion.

use agentflow_demos::{agent_with_graph, build_runtime, edge, node, InMemoryAgentStore, InMemoryRunStore};
use agentflow_graph::{Graph, NodeType, RunStatus};
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
            node("approve", NodeType::HumanInput, json!({"prompt": "approve the plan?"})),
            node("end", NodeType::End, json!({"output_message": "approved"})),
        ],
        edges: vec![edge("e1", "start", "approve"), edge("e2", "approve", "end")],
    };
    agent_store.insert(agent_with_graph(tenant_id, "interruptible", graph));

    let runtime = build_runtime(agent_store, run_store.clone(), vec![]);
    let (started, mut stream) = runtime
        .run_and_stream(tenant_id, "interruptible", json!({}), "debug")
        .await
        .expect("agent slug is registered above");

    println!("started run {}", started.run_id);
    while let Some(event) = stream.next().await {
        println!("{} {}", event.event, event.data);
    }

    loop {
        match run_store.get(started.run_id).await {
            Some(run) if run.status == RunStatus::Paused => break,
            _ => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
        }
    }
    println!("run paused, resuming with approval");

    let (_, mut resumed) = runtime
        .resume_run(started.run_id, json!({"approval": "approve"}), "production")
        .await
        .expect("run is paused");
    while let Some(event) = resumed.next().await {
        println!("{} {}", event.event, event.data);
    }

    for _ in 0..50 {
        if let Some(run) = run_store.get(started.run_id).await {
            if run.status.is_terminal() {
                println!("final status: {:?}", run.status);
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    eprintln!("run did not terminate in time");
}
