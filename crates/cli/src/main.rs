//! `leadflow` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — validate a workflow definition JSON file.
//! - `simulate` — dry-run a workflow for one contact against mock providers.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use tracing::info;

use actions::mock::MockHub;
use actions::types::{Contact, SuspendKind};
use engine::{validate_graph, ExecutorConfig, RunExecutor, Scheduler, WorkflowGraph};
use store::{MemoryStore, RunStatus, RunStore, StoredWorkflow, WorkflowRun};

#[derive(Parser)]
#[command(
    name = "leadflow",
    about = "Resumable lead-nurturing workflow engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: std::path::PathBuf,
    },
    /// Dry-run a workflow for one contact.  Collaborators are mocked and
    /// always succeed; webhooks are answered positively and wait timers are
    /// fast-forwarded.
    Simulate {
        /// Path to the workflow JSON file.
        graph: std::path::PathBuf,
        /// Path to a contact JSON file.
        contact: std::path::PathBuf,
        /// Operational timezone for window and backoff math.
        #[arg(long, default_value = "Europe/Madrid")]
        timezone: String,
        /// Abort after this many scheduler ticks.
        #[arg(long, default_value_t = 25)]
        max_ticks: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { path } => {
            let graph = load_graph(&path);
            match validate_graph(&graph) {
                Ok(()) => {
                    let entry = graph
                        .entry_node()
                        .map(|n| n.id.as_str())
                        .unwrap_or("<none>");
                    println!(
                        "✅ Workflow is valid: {} nodes, {} edges, entry node `{entry}`.",
                        graph.nodes.len(),
                        graph.edges.len()
                    );
                }
                Err(e) => {
                    eprintln!("❌ Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Simulate {
            graph,
            contact,
            timezone,
            max_ticks,
        } => {
            let tz: Tz = timezone
                .parse()
                .unwrap_or_else(|_| panic!("unknown timezone: {timezone}"));
            simulate(&graph, &contact, tz, max_ticks).await;
        }
    }
}

fn load_graph(path: &std::path::Path) -> WorkflowGraph {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));
    let definition: serde_json::Value =
        serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"));
    WorkflowGraph::from_definition(definition).unwrap_or_else(|e| {
        eprintln!("❌ Undecodable workflow: {e}");
        std::process::exit(1);
    })
}

async fn simulate(
    graph_path: &std::path::Path,
    contact_path: &std::path::Path,
    tz: Tz,
    max_ticks: u32,
) {
    let content = std::fs::read_to_string(graph_path)
        .unwrap_or_else(|e| panic!("cannot read file {}: {e}", graph_path.display()));
    let definition: serde_json::Value =
        serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"));

    let graph = WorkflowGraph::from_definition(definition.clone()).unwrap_or_else(|e| {
        eprintln!("❌ Undecodable workflow: {e}");
        std::process::exit(1);
    });
    if let Err(e) = validate_graph(&graph) {
        eprintln!("❌ Validation failed: {e}");
        std::process::exit(1);
    }
    let entry = graph
        .entry_node()
        .expect("validated graph has an entry node")
        .id
        .clone();

    let contact_json = std::fs::read_to_string(contact_path)
        .unwrap_or_else(|e| panic!("cannot read file {}: {e}", contact_path.display()));
    let contact: Contact =
        serde_json::from_str(&contact_json).unwrap_or_else(|e| panic!("invalid contact: {e}"));

    let store = Arc::new(MemoryStore::new());
    let workflow = StoredWorkflow::new(
        graph_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("simulated"),
        definition,
    );
    let workflow_id = workflow.id;
    store.put_workflow(workflow).await.expect("seed workflow");
    store
        .upsert_contact(contact.clone())
        .await
        .expect("seed contact");

    let run = WorkflowRun::activate(workflow_id, contact.id.clone(), entry);
    let run_id = run.id;
    store.insert_run(run).await.expect("seed run");

    let hub = Arc::new(MockHub::succeeding());
    let executor = RunExecutor::new(
        store.clone(),
        Arc::new(hub.dispatcher()),
        ExecutorConfig {
            timezone: tz,
            ..ExecutorConfig::default()
        },
    );
    let scheduler = Scheduler::new(store.clone(), executor);

    info!(%run_id, contact = %contact.id, "simulation started");
    let mut now = Utc::now();

    for tick in 1..=max_ticks {
        scheduler.tick(now).await.expect("scheduler tick failed");

        let run = store.get_run(run_id).await.expect("run disappeared");
        println!(
            "tick {tick:>2} @ {now}  status={} node={}",
            run.status, run.current_node_id
        );

        if run.status.is_terminal() {
            report(&run, &hub);
            return;
        }

        match run.status {
            RunStatus::WaitingForCallback => {
                println!("         ↳ call-result webhook answers: connected");
                store
                    .record_call_result(run_id, &run.current_node_id, true)
                    .await
                    .expect("record call result");
            }
            RunStatus::Waiting
                if run
                    .context
                    .nodes
                    .get(&run.current_node_id)
                    .is_some_and(|o| o.suspend == Some(SuspendKind::Timeout)) =>
            {
                println!("         ↳ reply webhook answers: contact replied");
                store
                    .record_reply(run_id, &run.current_node_id)
                    .await
                    .expect("record reply");
            }
            _ => {
                if let Some(at) = run.next_run_at {
                    if at > now {
                        println!("         ↳ fast-forwarding clock to {at}");
                        now = at;
                    }
                }
            }
        }
    }

    let run = store.get_run(run_id).await.expect("run disappeared");
    println!("⏱ Simulation stopped after {max_ticks} ticks at node `{}`.", run.current_node_id);
    report(&run, &hub);
}

fn report(run: &WorkflowRun, hub: &MockHub) {
    match run.status {
        RunStatus::Completed => println!("✅ Run completed at node `{}`.", run.current_node_id),
        RunStatus::Failed => println!(
            "❌ Run failed: {}",
            run.context.last_error.as_deref().unwrap_or("unknown error")
        ),
        _ => {}
    }
    let log = hub.call_log();
    if !log.is_empty() {
        println!("Collaborator activity:");
        for entry in log {
            println!("  - {entry}");
        }
    }
}
